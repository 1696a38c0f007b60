//! The individual checks. Each module owns its command line options, its metric table and a
//! `run` function which turns one response into a [Report](crate::Report).

#[cfg(feature = "amqp")]
pub mod amqp_alive;
pub mod kibana;
pub mod rabbitmq_overview;
pub mod rabbitmq_queues;
