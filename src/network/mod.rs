pub mod http;
pub mod port;
pub mod public_ip;

pub use port::{parse_port, random_free_port, PortProbe, SocketProbe};
pub use public_ip::lookup_public_ip;
