pub mod message;
pub mod user;

pub use message::{MessageModel, NewMessage};
pub use user::{NewUser, UserModel};
