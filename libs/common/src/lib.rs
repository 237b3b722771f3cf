pub mod id;
pub mod protocol;
pub mod room;

pub use protocol::{Envelope, EventName, OrderStatus, Role};
pub use room::Room;
