pub mod contact;
pub mod group;
pub mod hash;
pub mod init;
pub mod input;
pub mod keygen;
pub mod ledger;
pub mod read;
pub mod send;
pub mod sign;
pub mod verify;
pub mod version;

pub use contact::Contact;
pub use group::Group;
pub use hash::Hash;
pub use init::Init;
pub use keygen::Keygen;
pub use ledger::Ledger;
pub use read::ReadMessage;
pub use send::SendMessage;
pub use sign::Sign;
pub use verify::Verify;
pub use version::Version;
