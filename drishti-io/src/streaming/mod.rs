//! Downstream streaming of camera records

pub mod messages;
pub mod udp_publisher;
pub mod wire;

pub use messages::OutputMessage;
pub use udp_publisher::{ChannelSink, PublisherConfig, UdpPublisher, spawn_publisher};
pub use wire::{Serializer, WireFormat, create_serializer};
