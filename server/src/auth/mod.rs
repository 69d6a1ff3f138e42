//! Platform session handling.
//!
//! Sign-in happens upstream in App Service Authentication; this module
//! turns what the platform forwards (the `/.auth/me` session payload or the
//! injected `x-ms-client-principal` headers) into a [`ClientPrincipal`].

mod claims;
mod principal;

pub use claims::{aliases, Claim, ClaimField};
pub use principal::{
    AuthError, ClientPrincipal, EasyAuthClient, ACCESS_TOKEN_HEADER, PRINCIPAL_HEADER,
    PRINCIPAL_ID_HEADER, PRINCIPAL_IDP_HEADER,
};
