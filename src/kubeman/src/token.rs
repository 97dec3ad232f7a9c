//! Parsing of `kubectl` secret output for the dashboard admin token.

const TOKEN_PREFIX: &str = "token:";

/// does `kubectl describe secret` output carry a token yet
pub fn has_token(description: &str) -> bool {
    description.contains(TOKEN_PREFIX)
}

/// Extract the token value from `kubectl describe secret` output.
///
/// Lines are trimmed and the first one starting with `token:` is used. When
/// no line starts with it (the marker only appeared mid-line) the last line
/// is used instead. Either way the prefix and surrounding whitespace are
/// stripped.
pub fn extract_token(description: &str) -> String {
    let mut selected = "";
    for line in description.lines().map(str::trim) {
        selected = line;
        if line.starts_with(TOKEN_PREFIX) {
            break;
        }
    }
    selected.replace(TOKEN_PREFIX, "").trim().to_owned()
}

/// first column of a `kubectl get secret | grep <admin>` line, if it names the
/// admin user
pub fn secret_name(listing: &str, admin: &str) -> Option<String> {
    listing
        .split_whitespace()
        .next()
        .filter(|name| name.contains(admin))
        .map(String::from)
}

#[cfg(test)]
mod test {

    use super::extract_token;
    use super::has_token;
    use super::secret_name;

    const DESCRIBE: &str = r#"Name:         admin-user-token-x7k2p
Namespace:    kubernetes-dashboard
Labels:       <none>
Annotations:  kubernetes.io/service-account.name: admin-user

Type:  kubernetes.io/service-account-token

Data
====
ca.crt:     1111 bytes
namespace:  20 bytes
token:      eyJhbGciOiJSUzI1NiIsImtpZCI6IjEyMyJ9.payload.signature
"#;

    #[test]
    fn test_extract_token() {
        assert!(has_token(DESCRIBE));
        assert_eq!(
            extract_token(DESCRIBE),
            "eyJhbGciOiJSUzI1NiIsImtpZCI6IjEyMyJ9.payload.signature"
        );
    }

    #[test]
    fn test_extract_token_surrounded_by_whitespace() {
        assert_eq!(extract_token("   token:   abc.def   \n"), "abc.def");
    }

    #[test]
    fn test_first_token_line_wins() {
        let output = "token: first\ntoken: second\n";
        assert_eq!(extract_token(output), "first");
    }

    #[test]
    fn test_falls_back_to_last_line() {
        let output = "Data\nsecret-token: abc\nnamespace: 20 bytes";
        assert!(has_token(output));
        assert_eq!(extract_token(output), "namespace: 20 bytes");
    }

    #[test]
    fn test_secret_name() {
        let listing = "admin-user-token-x7k2p   kubernetes.io/service-account-token   3      2m\n";
        assert_eq!(
            secret_name(listing, "admin-user"),
            Some("admin-user-token-x7k2p".to_owned())
        );
        assert_eq!(secret_name(listing, "operator"), None);
        assert_eq!(secret_name("", "admin-user"), None);
    }
}
