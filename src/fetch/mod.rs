mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;

use anyhow::{Result, bail};

/// POSTs `fields` as a URL-encoded form and returns the body of a `200 OK` response.
///
/// Any other status is an error carrying the status code.
pub async fn post_form<C: HttpClient>(
    client: &C,
    url: &str,
    fields: &[(&str, &str)],
) -> Result<Vec<u8>> {
    let req = reqwest::Client::new().post(url).form(fields).build()?;

    let resp = client.execute(req).await?;
    let status = resp.status();
    if status != reqwest::StatusCode::OK {
        bail!("Request to {url} returned a {} code", status.as_u16());
    }
    Ok(resp.bytes().await?.to_vec())
}
