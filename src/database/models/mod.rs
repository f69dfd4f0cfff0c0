pub mod data_item;
pub mod user;

pub use data_item::{DataItem, DataItemChanges, NewDataItem};
pub use user::{NewUser, User, UserResponse};
