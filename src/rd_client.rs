use crate::config::Config;
use crate::errors::AppError;
use crate::models::RegistryLookupResult;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use reqwest::Client;

/// XML namespace of the RD VAT service elements.
pub const RD_NAMESPACE: &str = "https://rdws.rd.go.th/JserviceRD3/vatserviceRD3";
/// SOAPAction header sent with every request.
pub const RD_SOAP_ACTION: &str = "https://rdws.rd.go.th/JserviceRD3/vatserviceRD3/Service";

const RD_USERNAME: &str = "anonymous";
const RD_PASSWORD: &str = "anonymous";

/// Client for the Thai Revenue Department VAT registry (SOAP 1.1).
#[derive(Clone)]
pub struct RdVatClient {
    client: Client,
    endpoint: String,
}

impl RdVatClient {
    pub fn new(config: &Config) -> Self {
        Self::with_endpoint(config.rd_service_url.clone())
    }

    /// Creates a client posting to `endpoint` instead of the configured URL.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Looks up a TIN in the registry.
    ///
    /// # Errors
    ///
    /// * `ExternalApiError` - the request could not be sent or the body not read.
    /// * `RegistryStatus` - the service answered with a non-2xx status.
    /// * `MissingServiceResult` - the envelope has no (or an empty) `ServiceResult`.
    /// * `MalformedResponse` - the XML or the embedded JSON could not be decoded.
    pub async fn lookup(&self, tin: &str) -> Result<RegistryLookupResult, AppError> {
        tracing::info!("Querying RD VAT registry for TIN {}", tin);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", RD_SOAP_ACTION)
            .body(build_envelope(tin))
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("RD request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to read RD response: {}", e))
        })?;
        tracing::debug!("RD response ({}): {}", status, body);

        if !status.is_success() {
            tracing::error!("RD registry returned error {}", status);
            return Err(AppError::RegistryStatus(status.as_u16()));
        }

        let payload = match extract_service_result(&body)? {
            Some(payload) if !payload.trim().is_empty() => payload,
            _ => {
                tracing::warn!("No ServiceResult found in the response: {}", body);
                return Err(AppError::MissingServiceResult);
            }
        };

        decode_service_result(&payload)
    }
}

/// Builds the SOAP request envelope for `tin`.
pub fn build_envelope(tin: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <Service xmlns="{ns}">
      <username>{user}</username>
      <password>{pass}</password>
      <TIN>{tin}</TIN>
      <Name></Name>
      <ProvinceCode>0</ProvinceCode>
      <BranchNumber>0</BranchNumber>
      <AmphurCode>0</AmphurCode>
    </Service>
  </soap:Body>
</soap:Envelope>"#,
        ns = RD_NAMESPACE,
        user = RD_USERNAME,
        pass = RD_PASSWORD,
        tin = quick_xml::escape::escape(tin),
    )
}

/// Returns the unescaped text of the first `ServiceResult` element in the RD namespace.
///
/// `Ok(None)` when the element is absent.
pub fn extract_service_result(xml: &str) -> Result<Option<String>, AppError> {
    let mut reader = NsReader::from_str(xml);
    let ns = Namespace(RD_NAMESPACE.as_bytes());

    loop {
        // `Some(is_empty)` once the element is found
        let found = match reader.read_resolved_event()? {
            (ResolveResult::Bound(bound), Event::Start(e))
                if bound == ns && e.local_name().as_ref() == b"ServiceResult" =>
            {
                Some(false)
            }
            (ResolveResult::Bound(bound), Event::Empty(e))
                if bound == ns && e.local_name().as_ref() == b"ServiceResult" =>
            {
                Some(true)
            }
            (_, Event::Eof) => return Ok(None),
            _ => None,
        };

        match found {
            Some(true) => return Ok(Some(String::new())),
            Some(false) => return read_element_text(&mut reader).map(Some),
            None => {}
        }
    }
}

// Collects text and CDATA up to the matching end tag.
fn read_element_text(reader: &mut NsReader<&[u8]>) -> Result<String, AppError> {
    let mut text = String::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Text(t) => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| AppError::MalformedResponse(format!("invalid XML text: {}", e)))?;
                text.push_str(&unescaped);
            }
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => return Ok(text),
            Event::End(_) => depth -= 1,
            Event::Eof => {
                return Err(AppError::MalformedResponse(
                    "unterminated ServiceResult element".to_string(),
                ))
            }
            _ => {}
        }
    }
}

/// Decodes the JSON object carried inside `ServiceResult`.
pub fn decode_service_result(payload: &str) -> Result<RegistryLookupResult, AppError> {
    Ok(serde_json::from_str(payload.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soap_response(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <ServiceResponse xmlns="{}">{}</ServiceResponse>
  </soap:Body>
</soap:Envelope>"#,
            RD_NAMESPACE, inner
        )
    }

    #[test]
    fn test_envelope_carries_tin_and_fixed_fields() {
        let envelope = build_envelope("0105551234567");

        assert!(envelope.contains("<TIN>0105551234567</TIN>"));
        assert!(envelope.contains("<username>anonymous</username>"));
        assert!(envelope.contains("<password>anonymous</password>"));
        assert!(envelope.contains("<Name></Name>"));
        assert!(envelope.contains("<ProvinceCode>0</ProvinceCode>"));
        assert!(envelope.contains("<BranchNumber>0</BranchNumber>"));
        assert!(envelope.contains("<AmphurCode>0</AmphurCode>"));
        assert!(envelope.contains(RD_NAMESPACE));
    }

    #[test]
    fn test_extract_unescapes_text() {
        let xml = soap_response(
            r#"<ServiceResult>{"BranchName":["A &amp; B"],"NID":["0105551234567"]}</ServiceResult>"#,
        );

        let payload = extract_service_result(&xml).unwrap().unwrap();
        assert_eq!(payload, r#"{"BranchName":["A & B"],"NID":["0105551234567"]}"#);
    }

    #[test]
    fn test_extract_reads_cdata() {
        let xml = soap_response(r#"<ServiceResult><![CDATA[{"NID":["1"]}]]></ServiceResult>"#);

        let payload = extract_service_result(&xml).unwrap().unwrap();
        assert_eq!(payload, r#"{"NID":["1"]}"#);
    }

    #[test]
    fn test_extract_ignores_other_namespaces() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body><ServiceResult xmlns="urn:other">{"NID":["1"]}</ServiceResult></soap:Body>
</soap:Envelope>"#;

        assert_eq!(extract_service_result(xml).unwrap(), None);
    }

    #[test]
    fn test_extract_missing_and_empty() {
        assert_eq!(
            extract_service_result(&soap_response("")).unwrap(),
            None
        );
        assert_eq!(
            extract_service_result(&soap_response("<ServiceResult/>")).unwrap(),
            Some(String::new())
        );
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(matches!(
            decode_service_result("[1, 2, 3]"),
            Err(AppError::MalformedResponse(_))
        ));
        assert!(matches!(
            decode_service_result("not json"),
            Err(AppError::MalformedResponse(_))
        ));

        let decoded = decode_service_result(r#" {"Province":["Bangkok"]} "#).unwrap();
        assert_eq!(decoded.first("Province").as_deref(), Some("Bangkok"));
    }
}
