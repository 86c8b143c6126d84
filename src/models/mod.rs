pub mod profile;
pub mod question;
pub mod room;

pub use profile::{Feature, UserProfile};
pub use question::Question;
pub use room::Room;
