//! HTTP access to the iGame backend.
//!
//! - [`AuthGateway`]: attaches credentials (bearer token or cookie jar) and
//!   normalises requests; returns raw responses.
//! - [`GameApi`]: one typed call per backend endpoint, with uniform error
//!   classification into [`ApiError`].
//! - [`CookieJar`]: an explicit, caller-owned cookie store. Cookies stay
//!   with the host that set them, and the jar serialises to JSON between runs.

pub mod client;
pub mod cookies;
pub mod error;
pub mod gateway;
pub mod responses;

pub use client::{ActiveGame, GameApi, NewGame};
pub use cookies::{CookieJar, ACCESS_TOKEN_COOKIE};
pub use error::{ApiError, GatewayError};
pub use gateway::{AuthGateway, GatewayConfig, RequestOptions};
pub use reqwest::Url;
pub use responses::{
    ActiveGameResponse, EndGameResponse, ErrorBody, ErrorField, GameResponse, LeaderboardResponse,
    LoginResponse, VerifyResponse,
};
