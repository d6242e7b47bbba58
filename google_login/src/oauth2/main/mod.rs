mod cookie;
mod core;
mod google;

pub use core::{AuthorizedUser, GoogleLogin, VerifiedCallback, redirect_with_profile};
