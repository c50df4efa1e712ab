//! `multipart/form-data` encoding for webhook uploads.

use rand::RngExt;

/// Multipart body under construction.
pub(crate) struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub(crate) fn new() -> Self {
        Self {
            boundary: format!("----HookcastBoundary{:016x}", rand::rng().random::<u64>()),
            body: Vec::new(),
        }
    }

    /// Add a text part with an explicit content type.
    pub(crate) fn text(&mut self, name: &str, content_type: &str, value: &str) {
        self.start_part();
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n", escape(name)).as_bytes(),
        );
        self.body
            .extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
    }

    /// Add a file part.
    pub(crate) fn file(&mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) {
        self.start_part();
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape(name),
                escape(filename)
            )
            .as_bytes(),
        );
        self.body
            .extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
    }

    /// Close the form, returning the `Content-Type` header value and the body.
    pub(crate) fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }

    fn start_part(&mut self) {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
    }
}

/// Quote-safe form of a disposition parameter.
fn escape(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encodes_parts_in_order() {
        let mut form = MultipartForm::new();
        form.text("payload_json", "application/json", r#"{"content":"hi"}"#);
        form.file("files[0]", "report.txt", "text/plain", b"data");
        let boundary = form.boundary.clone();

        let (content_type, body) = form.finish();

        assert_eq!(content_type, format!("multipart/form-data; boundary={boundary}"));
        let expected = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"payload_json\"\r\n\
             Content-Type: application/json\r\n\r\n\
             {{\"content\":\"hi\"}}\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"files[0]\"; filename=\"report.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             data\r\n\
             --{boundary}--\r\n"
        );
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn test_escapes_quotes_in_filename() {
        let mut form = MultipartForm::new();
        form.file("files[0]", "a\"b.txt", "text/plain", b"");

        let (_, body) = form.finish();

        assert!(String::from_utf8(body).unwrap().contains("filename=\"a%22b.txt\""));
    }

    #[test]
    fn test_boundaries_differ() {
        assert_ne!(MultipartForm::new().boundary, MultipartForm::new().boundary);
    }
}
