pub mod account;
pub mod activation;
pub mod auth;
pub mod prayer;
pub mod settings;

pub use account::Account;
pub use activation::Activation;
pub use auth::Auth;
pub use prayer::Prayer;
pub use settings::Settings;
