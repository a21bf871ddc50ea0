//! Built-in vendor platforms.

pub mod cisco_iosxr;
pub mod juniper;
pub mod nokia_srl;
pub mod nokia_sros;
