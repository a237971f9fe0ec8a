use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Method;

use crate::core::error::{UpdaterError, UpdaterResult};

const APP_USER_AGENT: &str = "LauncherUpdater/0.1.0";
const READ_CHUNK: usize = 64 * 1024;
/// Upper bound on the buffer reserved up front from a declared `Content-Length`.
const MAX_PREALLOCATION: u64 = 16 * READ_CHUNK as u64;

/// Blocking byte fetcher used by every network step of an update pass.
///
/// `progress` receives the cumulative number of bytes read so far.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, progress: &mut dyn FnMut(u64)) -> UpdaterResult<Vec<u8>>;
}

pub fn build_http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
}

impl Transport for Client {
    fn get(&self, url: &str, progress: &mut dyn FnMut(u64)) -> UpdaterResult<Vec<u8>> {
        let mut response = self.request(Method::GET, url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdaterError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let capacity = response
            .content_length()
            .unwrap_or(0)
            .min(MAX_PREALLOCATION) as usize;
        let mut data = Vec::with_capacity(capacity);
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let read = response
                .read(&mut chunk)
                .map_err(|source| UpdaterError::Other(format!("read error for {url}: {source}")))?;
            if read == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..read]);
            progress(data.len() as u64);
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use super::*;

    /// Serve one canned raw HTTP response on a local port and return its URL.
    fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0u8; 1024];
                let _ = stream.read(&mut request);
                let _ = stream.write_all(response);
                let _ = stream.flush();
            }
        });
        format!("http://{addr}/files.json")
    }

    fn client() -> Client {
        // Loopback traffic must not go through a proxy configured in the environment.
        Client::builder()
            .no_proxy()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap()
    }

    #[test]
    fn body_is_returned_with_cumulative_progress() {
        let url = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello");
        let mut reported = Vec::new();

        let body = Transport::get(&client(), &url, &mut |bytes| reported.push(bytes)).unwrap();

        assert_eq!(body, b"hello");
        assert_eq!(reported.last(), Some(&5));
    }

    #[test]
    fn oversized_content_length_is_an_error_not_an_abort() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 1099511627776000\r\nConnection: close\r\n\r\nabc",
        );

        let result = Transport::get(&client(), &url, &mut |_| {});

        assert!(result.is_err());
    }

    #[test]
    fn error_status_maps_to_download_failed() {
        let url = serve_once(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");

        let err = Transport::get(&client(), &url, &mut |_| {}).unwrap_err();

        assert!(matches!(err, UpdaterError::DownloadFailed { status: 404, .. }));
    }
}
