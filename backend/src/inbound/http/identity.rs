//! Caller identity extractor.
//!
//! There is no authentication: the composition root resolves one fixed user
//! at start-up and registers it as app data. Handlers take a [`Caller`]
//! argument and receive that identity on every request.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};

use crate::domain::{Caller, Error};

impl FromRequest for Caller {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.app_data::<web::Data<Caller>>()
                .map(|caller| caller.get_ref().clone())
                .ok_or_else(|| Error::unauthorized("no caller identity configured")),
        )
    }
}
