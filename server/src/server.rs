use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::error::{ErrorBody, Failure};
use crate::geocoder::Geocoder;
use crate::locator::Locator;
use crate::models::CalculateRequest;

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub async fn run<G: Geocoder>(
    address: std::net::SocketAddr,
    locator: Arc<Locator<G>>,
    static_dir: PathBuf,
) {
    log::info!("Listening on http://{}", address);
    warp::serve(routes(locator, static_dir)).run(address).await
}

pub fn routes<G: Geocoder>(
    locator: Arc<Locator<G>>,
    static_dir: PathBuf,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    // path filters first, so unknown paths reject as 404 rather than 405
    let index_route = warp::path::end()
        .and(warp::get())
        .and(warp::fs::file(static_dir.join("index.html")));

    let static_route = warp::path("static")
        .and(warp::fs::dir(static_dir))
        .with(warp::compression::gzip());

    let health_route = warp::path!("health")
        .and(warp::get())
        .map(|| StatusCode::OK);

    let calculate_route = warp::path!("calculate")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_locator(locator))
        .and_then(calculate);

    index_route
        .or(static_route)
        .or(health_route)
        .or(calculate_route)
        .recover(rejection)
}

fn with_locator<G: Geocoder>(
    locator: Arc<Locator<G>>,
) -> impl Filter<Extract = (Arc<Locator<G>>,), Error = Infallible> + Clone {
    warp::any().map(move || locator.clone())
}

pub async fn calculate<G: Geocoder>(
    request: CalculateRequest,
    locator: Arc<Locator<G>>,
) -> Result<warp::reply::Response, Rejection> {
    match locator.locate(request.address.as_deref()).await {
        Ok(response) => Ok(warp::reply::json(&response).into_response()),
        Err(failure) => Ok(failure_reply(&failure).into_response()),
    }
}

fn failure_reply(failure: &Failure) -> impl Reply {
    warp::reply::with_status(warp::reply::json(&failure.body()), failure.status)
}

pub async fn rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found.")
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid request body.")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large.")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content length required.")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed.")
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported media type.")
    } else {
        log::error!("Error: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
    };

    let json = warp::reply::json(&ErrorBody {
        success: false,
        error: message.into(),
    });

    Ok(warp::reply::with_status(json, code))
}
