//! Sign-in, sign-up and sign-out against an external identity provider.
//!
//! The provider owns credentials and tokens. These flows only validate input, call it, and
//! publish whatever user it reports into the [`SessionContext`].
use wasm_bindgen::prelude::*;

use crate::error::GalleryError;
use crate::models::User;
use crate::session::SessionContext;
use crate::validators::{PASSWORD_RULES, validate_password};

#[derive(serde::Serialize, serde::Deserialize, tsify::Tsify, Debug, Clone, PartialEq, Eq, Default)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub password: String,
}

#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, GalleryError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, GalleryError>;

    /// OAuth popup sign-in.
    async fn sign_in_with_popup(&self) -> Result<User, GalleryError>;

    async fn update_profile(
        &self,
        display_name: &str,
        photo_url: Option<&str>,
    ) -> Result<(), GalleryError>;

    async fn sign_out(&self) -> Result<(), GalleryError>;
}

pub async fn register<P: IdentityProvider>(
    provider: &P,
    session: &SessionContext,
    registration: &Registration,
) -> Result<User, GalleryError> {
    if !validate_password(&registration.password).ok {
        return Err(GalleryError::Invalid(PASSWORD_RULES.to_string()));
    }
    let email = registration.email.trim();
    if email.is_empty() {
        return Err(GalleryError::Invalid("Email is required".to_string()));
    }

    let mut user = provider.sign_up(email, &registration.password).await?;

    let name = registration.name.trim();
    let photo_url = registration
        .photo_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());
    provider.update_profile(name, photo_url).await?;

    user.display_name = Some(name.to_string()).filter(|n| !n.is_empty());
    user.photo_url = photo_url.map(str::to_string);

    log::info!("Registered {}", user.email);
    session.set_user(Some(user.clone()));
    Ok(user)
}

pub async fn login<P: IdentityProvider>(
    provider: &P,
    session: &SessionContext,
    email: &str,
    password: &str,
) -> Result<User, GalleryError> {
    let user = provider.sign_in_with_password(email.trim(), password).await?;
    session.set_user(Some(user.clone()));
    Ok(user)
}

pub async fn login_with_popup<P: IdentityProvider>(
    provider: &P,
    session: &SessionContext,
) -> Result<User, GalleryError> {
    let user = provider.sign_in_with_popup().await?;
    session.set_user(Some(user.clone()));
    Ok(user)
}

pub async fn logout<P: IdentityProvider>(
    provider: &P,
    session: &SessionContext,
) -> Result<(), GalleryError> {
    provider.sign_out().await?;
    session.set_user(None);
    Ok(())
}

/// An [`IdentityProvider`] made of promise-returning JS functions, so the provider SDK can stay
/// on the JS side.
#[wasm_bindgen]
pub struct JsIdentityProvider {
    sign_in_with_password: js_sys::Function,
    sign_up: js_sys::Function,
    sign_in_with_popup: js_sys::Function,
    update_profile: js_sys::Function,
    sign_out: js_sys::Function,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl JsIdentityProvider {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(
        sign_in_with_password: js_sys::Function,
        sign_up: js_sys::Function,
        sign_in_with_popup: js_sys::Function,
        update_profile: js_sys::Function,
        sign_out: js_sys::Function,
    ) -> Self {
        Self {
            sign_in_with_password,
            sign_up,
            sign_in_with_popup,
            update_profile,
            sign_out,
        }
    }
}

impl JsIdentityProvider {
    /// Await whatever the JS function returned, promise or not.
    async fn settle(result: Result<JsValue, JsValue>) -> Result<JsValue, GalleryError> {
        let identity_error = |e: JsValue| GalleryError::Identity(crate::utils::js_error(e));
        let value = result.map_err(identity_error)?;
        let promise = js_sys::Promise::resolve(&value);
        wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map_err(identity_error)
    }

    fn user_from(value: JsValue) -> Result<User, GalleryError> {
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| GalleryError::Identity(format!("unexpected user object: {e}")))
    }
}

impl IdentityProvider for JsIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, GalleryError> {
        let result = self.sign_in_with_password.call2(
            &JsValue::NULL,
            &JsValue::from_str(email),
            &JsValue::from_str(password),
        );
        Self::user_from(Self::settle(result).await?)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, GalleryError> {
        let result = self.sign_up.call2(
            &JsValue::NULL,
            &JsValue::from_str(email),
            &JsValue::from_str(password),
        );
        Self::user_from(Self::settle(result).await?)
    }

    async fn sign_in_with_popup(&self) -> Result<User, GalleryError> {
        let result = self.sign_in_with_popup.call0(&JsValue::NULL);
        Self::user_from(Self::settle(result).await?)
    }

    async fn update_profile(
        &self,
        display_name: &str,
        photo_url: Option<&str>,
    ) -> Result<(), GalleryError> {
        let photo_url = photo_url.map_or(JsValue::NULL, JsValue::from_str);
        let result =
            self.update_profile
                .call2(&JsValue::NULL, &JsValue::from_str(display_name), &photo_url);
        Self::settle(result).await.map(|_| ())
    }

    async fn sign_out(&self) -> Result<(), GalleryError> {
        let result = self.sign_out.call0(&JsValue::NULL);
        Self::settle(result).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeProvider {
        calls: RefCell<Vec<String>>,
        reject_sign_up: bool,
    }

    impl IdentityProvider for FakeProvider {
        async fn sign_in_with_password(
            &self,
            email: &str,
            _password: &str,
        ) -> Result<User, GalleryError> {
            self.calls.borrow_mut().push(format!("sign_in {email}"));
            Ok(User {
                email: email.to_string(),
                ..Default::default()
            })
        }

        async fn sign_up(&self, email: &str, _password: &str) -> Result<User, GalleryError> {
            self.calls.borrow_mut().push(format!("sign_up {email}"));
            if self.reject_sign_up {
                return Err(GalleryError::Identity("email-already-in-use".into()));
            }
            Ok(User {
                email: email.to_string(),
                ..Default::default()
            })
        }

        async fn sign_in_with_popup(&self) -> Result<User, GalleryError> {
            self.calls.borrow_mut().push("popup".into());
            Ok(User {
                email: "pop@example.com".into(),
                ..Default::default()
            })
        }

        async fn update_profile(
            &self,
            display_name: &str,
            _photo_url: Option<&str>,
        ) -> Result<(), GalleryError> {
            self.calls
                .borrow_mut()
                .push(format!("update_profile {display_name}"));
            Ok(())
        }

        async fn sign_out(&self) -> Result<(), GalleryError> {
            self.calls.borrow_mut().push("sign_out".into());
            Ok(())
        }
    }

    fn registration(password: &str) -> Registration {
        Registration {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            photo_url: Some(" ".into()),
            password: password.into(),
        }
    }

    #[test]
    fn test_weak_password_never_reaches_provider() {
        let provider = FakeProvider::default();
        let session = SessionContext::new();

        let err = futures::executor::block_on(register(&provider, &session, &registration("abc")))
            .unwrap_err();

        assert!(matches!(err, GalleryError::Invalid(message) if message == PASSWORD_RULES));
        assert!(provider.calls.borrow().is_empty());
        assert!(session.is_loading());
    }

    #[test]
    fn test_register_signs_up_then_updates_profile() {
        let provider = FakeProvider::default();
        let session = SessionContext::new();

        let user =
            futures::executor::block_on(register(&provider, &session, &registration("Secret1")))
                .unwrap();

        assert_eq!(
            *provider.calls.borrow(),
            ["sign_up ana@example.com", "update_profile Ana"]
        );
        assert_eq!(user.display_name.as_deref(), Some("Ana"));
        assert_eq!(user.photo_url, None);
        assert_eq!(session.user(), Some(user));
    }

    #[test]
    fn test_failed_sign_up_leaves_session_alone() {
        let provider = FakeProvider {
            reject_sign_up: true,
            ..Default::default()
        };
        let session = SessionContext::with_user(None);

        let result =
            futures::executor::block_on(register(&provider, &session, &registration("Secret1")));

        assert!(matches!(result, Err(GalleryError::Identity(_))));
        assert_eq!(*provider.calls.borrow(), ["sign_up ana@example.com"]);
        assert_eq!(session.user(), None);
    }

    #[test]
    fn test_login_and_logout_publish_to_session() {
        let provider = FakeProvider::default();
        let session = SessionContext::new();

        futures::executor::block_on(login(&provider, &session, " bo@example.com ", "pw")).unwrap();
        assert_eq!(session.user().map(|u| u.email).as_deref(), Some("bo@example.com"));

        futures::executor::block_on(logout(&provider, &session)).unwrap();
        assert_eq!(session.user(), None);

        futures::executor::block_on(login_with_popup(&provider, &session)).unwrap();
        assert_eq!(session.user().map(|u| u.email).as_deref(), Some("pop@example.com"));
    }
}
