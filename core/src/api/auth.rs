//! `/auth`: credentials travel as multipart form fields, not JSON.

use super::Endpoint;
use crate::http::Multipart;
use crate::types::{AuthToken, RegisterUser, Registration};

pub fn login(email: &str, password: &str) -> Endpoint<AuthToken> {
    let form = Multipart::new().text("email", email).text("password", password);
    Endpoint::post_form("/auth/login", form)
}

pub fn register(user: &RegisterUser) -> Endpoint<Registration> {
    let form = user
        .fields()
        .into_iter()
        .fold(Multipart::new(), |form, (name, value)| form.text(name, value));
    Endpoint::post_form("/auth/register", form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    #[test]
    fn login_sends_form_fields() {
        let endpoint = login("a@b.com", "x");
        assert_eq!(endpoint.request.method, HttpMethod::Post);
        assert_eq!(endpoint.request.path, "/auth/login");
        let form = endpoint.request.body.as_multipart().unwrap();
        assert_eq!(form.text_value("email"), Some("a@b.com"));
        assert_eq!(form.text_value("password"), Some("x"));
        assert!(endpoint.request.body.as_json().is_none());
    }

    #[test]
    fn register_sends_every_present_field() {
        let user = RegisterUser {
            name: "Ann".into(),
            username: "ann".into(),
            email: "ann@example.com".into(),
            password: "secret123".into(),
            phone: Some("555".into()),
            ..Default::default()
        };
        let endpoint = register(&user);
        let form = endpoint.request.body.as_multipart().unwrap();
        let names: Vec<_> = form.parts().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["name", "username", "email", "password", "phone"]);
        assert_eq!(form.text_value("phone"), Some("555"));
    }
}
