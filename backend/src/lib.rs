//! Backend library modules.

pub mod domain;

pub use domain::{
    BatchRegistrationConfig, BatchRegistrationCoordinator, CredentialVault, IdentityTokenReader,
    UserDirectory,
};
