use crate::api::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// The browser's `fetch`, through `fetch-happen`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl Transport for FetchTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let client = fetch_happen::Client;
        let url = request.url.as_str();
        let mut builder = match request.method {
            HttpMethod::Get => client.get(url),
            HttpMethod::Post => client.post(url),
            HttpMethod::Put => client.put(url),
            HttpMethod::Patch => client.patch(url),
            HttpMethod::Delete => client.delete(url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body).map_err(|e| format!("{e:?}"))?;
        }

        let response = builder.send().await.map_err(|e| format!("{e:?}"))?;
        let status = u16::from(response.status());
        let text = response.text().await.map_err(|e| format!("{e:?}"))?;

        Ok(HttpResponse { status, text })
    }
}
