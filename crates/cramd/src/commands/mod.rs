use super::*;

pub mod ask;
pub mod clean;
pub mod import;
pub mod init;
pub mod key;
pub mod list;
pub mod login;
pub mod logout;
pub mod sync;

pub use ask::ask;
pub use clean::clean;
pub use import::import;
pub use init::init;
pub use key::key;
pub use list::list;
pub use login::login;
pub use logout::logout;
pub use sync::sync;

/// Available commands for the CLI
#[derive(Subcommand)]
pub enum Commands {
  /// Initialize the configuration and the local store
  Init(init::InitArgs),

  /// Persist the API credential used for generation
  Key(key::KeyArgs),

  /// Import a course document and generate study material from it
  Import(import::ImportArgs),

  /// List stored subjects and artifact counts
  List,

  /// Ask the study assistant a question
  Ask(ask::AskArgs),

  /// Sign in and sync study data with the cloud
  Login(login::LoginArgs),

  /// Sign out, leaving local study data untouched
  Logout,

  /// Push and pull the cloud snapshot for the signed-in user
  Sync,

  /// Remove the local store after confirmation
  Clean,
}
