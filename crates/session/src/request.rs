//! Replayable request descriptors
//!
//! A [`reqwest::RequestBuilder`] is consumed when sent and multipart forms
//! cannot be cloned, so requests are described by [`ApiRequest`] and turned
//! into a fresh builder for every attempt.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use url::Url;

use crate::error::Result;

/// One field of a `multipart/form-data` body
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

impl FormField {
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }

    fn into_part(self) -> Result<(String, Part)> {
        match self {
            Self::Text { name, value } => Ok((name, Part::text(value))),
            Self::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                let mut part = Part::bytes(data.to_vec()).file_name(file_name);
                if let Some(mime) = content_type {
                    part = part.mime_str(&mime)?;
                }
                Ok((name, part))
            }
        }
    }
}

/// Request body
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Form(Vec<FormField>),
}

/// An outgoing API request: method, path relative to the API base URL,
/// query pairs, extra headers, and body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a header to the request
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Use a multipart form body
    pub fn form(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    /// Resolve the path against the API base URL, keeping any path prefix
    /// the base carries (e.g. `/api`)
    pub fn url(&self, base_url: &Url) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            base_url.as_str().trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)?;

        if !self.query.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                query_pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Build a sendable request, optionally carrying a bearer token
    pub(crate) fn build(
        &self,
        client: &Client,
        base_url: &Url,
        bearer: Option<&str>,
    ) -> Result<RequestBuilder> {
        let url = self.url(base_url)?;
        let mut req = client.request(self.method.clone(), url);

        for (name, value) in &self.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }

        req = match &self.body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.json(value),
            RequestBody::Form(fields) => {
                let mut form = Form::new();
                for field in fields.iter().cloned() {
                    let (name, part) = field.into_part()?;
                    form = form.part(name, part);
                }
                req.multipart(form)
            }
        };

        Ok(req)
    }
}
