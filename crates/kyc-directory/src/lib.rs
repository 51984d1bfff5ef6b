//! KYC Directory: organization lifecycle, tag assignment and
//! `eval_user_tag_expression` over the Tag Store.

pub mod config;
pub mod service;

pub use config::DirectoryConfig;
pub use service::KycService;
