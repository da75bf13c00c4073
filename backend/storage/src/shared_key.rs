//! SharedKey request signing for the Blob and Table services.
//!
//! The signature is `Base64(HMAC-SHA256(account_key, UTF8(string_to_sign)))`,
//! sent as `Authorization: SharedKey <account>:<signature>`.

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::Sha256;

/// Value for the `x-ms-date` header.
pub fn rfc1123(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// `/<account><path>`, the resource part shared by both services.
pub fn canonical_resource(account: &str, url: &Url) -> String {
    format!("/{}{}", account, url.path())
}

/// Blob service resource: the path plus every query parameter as
/// `\n<lowercase name>:<value>`, sorted by name.
pub fn blob_canonical_resource(account: &str, url: &Url) -> String {
    let mut resource = canonical_resource(account, url);
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
        .collect();
    params.sort();
    for (name, value) in params {
        resource.push('\n');
        resource.push_str(&name);
        resource.push(':');
        resource.push_str(&value);
    }
    resource
}

/// Blob service string-to-sign. `ms_headers` are the `x-ms-*` headers sent.
pub fn blob_string_to_sign(
    verb: &str,
    content_length: usize,
    content_type: &str,
    ms_headers: &[(&str, &str)],
    canonical_resource: &str,
) -> String {
    // Zero length is signed as the empty string.
    let length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };
    let mut out = [
        verb, "", "", length.as_str(), "", content_type, "", "", "", "", "", "",
    ]
    .join("\n");
    out.push('\n');

    let mut headers: Vec<(String, &str)> = ms_headers
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.trim()))
        .collect();
    headers.sort();
    for (name, value) in headers {
        out.push_str(&name);
        out.push(':');
        out.push_str(value);
        out.push('\n');
    }
    out.push_str(canonical_resource);
    out
}

/// Table service string-to-sign.
pub fn table_string_to_sign(verb: &str, content_type: &str, date: &str, canonical_resource: &str) -> String {
    format!("{verb}\n\n{content_type}\n{date}\n{canonical_resource}")
}

/// Sign `string_to_sign` with the decoded account key.
pub fn sign(account_key: &[u8], string_to_sign: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(account_key).expect("HMAC accepts keys of any length");
    mac.update(string_to_sign.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

pub fn authorization(account: &str, signature: &str) -> String {
    format!("SharedKey {account}:{signature}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DEV_KEY: &str =
        "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
    const DATE: &str = "Sat, 19 Oct 2024 10:00:00 GMT";

    fn key() -> Vec<u8> {
        STANDARD.decode(DEV_KEY).unwrap()
    }

    #[test]
    fn formats_rfc1123_dates() {
        let at = Utc.with_ymd_and_hms(2024, 10, 19, 10, 0, 0).unwrap();
        assert_eq!(rfc1123(at), DATE);
    }

    #[test]
    fn signs_put_blob() {
        let url = Url::parse("http://127.0.0.1:10000/devstoreaccount1/uploaded-images/a.jpg").unwrap();
        let resource = blob_canonical_resource("devstoreaccount1", &url);
        assert_eq!(resource, "/devstoreaccount1/devstoreaccount1/uploaded-images/a.jpg");

        let to_sign = blob_string_to_sign(
            "PUT",
            11,
            "image/jpeg",
            &[
                ("x-ms-version", "2021-08-06"),
                ("x-ms-date", DATE),
                ("x-ms-blob-type", "BlockBlob"),
            ],
            &resource,
        );
        assert!(to_sign.starts_with("PUT\n\n\n11\n\nimage/jpeg\n"));
        assert_eq!(sign(&key(), &to_sign), "ewn2FgZDodeiP81YVV420xJL8sPErPP9P1zEXthAcCo=");
    }

    #[test]
    fn signs_insert_entity() {
        let url = Url::parse("http://127.0.0.1:10002/devstoreaccount1/DetectionResults").unwrap();
        let resource = canonical_resource("devstoreaccount1", &url);
        let to_sign = table_string_to_sign("POST", "application/json", DATE, &resource);
        assert_eq!(sign(&key(), &to_sign), "5AIVlZaOrDuWElxeTkXMSsAs3ZsBBczxobEC6YpOBd0=");
    }

    #[test]
    fn query_parameters_join_the_blob_resource() {
        let url = Url::parse("https://roach.blob.core.windows.net/uploaded-images?restype=container").unwrap();
        assert_eq!(
            blob_canonical_resource("roach", &url),
            "/roach/uploaded-images\nrestype:container"
        );
    }

    #[test]
    fn empty_body_signs_empty_length() {
        let s = blob_string_to_sign("PUT", 0, "", &[], "/a/b");
        assert_eq!(s, "PUT\n\n\n\n\n\n\n\n\n\n\n\n/a/b");
    }

    #[test]
    fn builds_authorization_header() {
        assert_eq!(authorization("roach", "c2ln"), "SharedKey roach:c2ln");
    }
}
