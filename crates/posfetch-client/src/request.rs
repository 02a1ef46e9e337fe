// SPDX-License-Identifier: Apache-2.0

use posfetch_model::{Credentials, Posident};

/// Fixed request envelope; only the credentials and the repeated identifier
/// elements vary between requests.
const REQUEST_TEMPLATE: &str = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:v2="http://katastr.cuzk.cz/ctios/types/v2.8">
  <soapenv:Header>
    <wsse:Security xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">
      <wsse:UsernameToken>
        <wsse:Username>${username}</wsse:Username>
        <wsse:Password>${password}</wsse:Password>
      </wsse:UsernameToken>
    </wsse:Security>
  </soapenv:Header>
  <soapenv:Body>
    <v2:CtiOsRequest>
${posidents}    </v2:CtiOsRequest>
  </soapenv:Body>
</soapenv:Envelope>
"#;

/// Renders the outbound document for one batch. Pure in the batch and the
/// credentials.
#[must_use]
pub fn render_request(credentials: &Credentials, batch: &[Posident]) -> String {
    let mut elements = String::new();
    for posident in batch {
        elements.push_str("      <v2:pOSIdent>");
        elements.push_str(&escape_text(posident.as_str()));
        elements.push_str("</v2:pOSIdent>\n");
    }
    REQUEST_TEMPLATE
        .replace("${username}", &escape_text(&credentials.username))
        .replace("${password}", &escape_text(&credentials.password))
        .replace("${posidents}", &elements)
}

fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}
