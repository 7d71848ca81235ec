use cpg_common::Secret;

/// Fill in an explorer endpoint template.
///
/// `{address}` is replaced with the url-encoded address and `{apikey}` with the API key. Templates without an
/// `{apikey}` placeholder are left alone, so that keyless explorers work unchanged.
pub fn render_endpoint(template: &str, address: &str, api_key: &Secret<String>) -> String {
    template.replace("{address}", &urlencoding::encode(address)).replace("{apikey}", api_key.reveal())
}
