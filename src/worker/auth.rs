//! Connection and login command handlers

use crate::platform::{Platform, PlatformError, PlatformSession};
use crate::protocol::Response;

use super::{PendingAuth, Worker};

/// Map a login-code failure to its user-facing message
///
/// Transient conditions get a friendly hint; everything else passes the
/// platform's own description through.
fn friendly_code_error(error: &PlatformError) -> String {
    match error {
        PlatformError::CodeOptionsExhausted => "验证码选项已用尽，请等待15-30分钟后重试".to_string(),
        PlatformError::RateLimited { .. } => "请求过于频繁，请稍后重试".to_string(),
        other => other.to_string(),
    }
}

impl<P: Platform> Worker<P> {
    /// Handle `connect`: create the session if absent and report the
    /// authorization flag; short-circuit on an existing session
    pub(super) async fn connect(&mut self) {
        if self.session.is_some() {
            self.respond(Response::ConnectResponse {
                success: true,
                is_authorized: Some(self.authorized),
                message: Some("已经连接".to_string()),
                error: None,
            });
            return;
        }

        match self.platform.connect().await {
            Ok(session) => match session.is_authorized().await {
                Ok(authorized) => {
                    self.authorized = authorized;
                    self.session = Some(session);
                    log::info!("connected, authorized: {authorized}");
                    self.respond(Response::ConnectResponse {
                        success: true,
                        is_authorized: Some(authorized),
                        message: None,
                        error: None,
                    });
                }
                Err(error) => {
                    log::error!("authorization query failed: {error}");
                    self.respond(Response::ConnectResponse {
                        success: false,
                        is_authorized: None,
                        message: None,
                        error: Some(error.to_string()),
                    });
                }
            },
            Err(error) => {
                log::error!("connect failed: {error}");
                self.respond(Response::ConnectResponse {
                    success: false,
                    is_authorized: None,
                    message: None,
                    error: Some(error.to_string()),
                });
            }
        }
    }

    /// Handle `send_code`: start a fresh session and request a login code
    ///
    /// Any existing session is torn down first (best effort), and a
    /// half-built session is dropped again on failure.
    pub(super) async fn send_code(&mut self, phone: &str) {
        if let Some(old) = self.session.take() {
            let _ = old.disconnect().await;
        }
        self.authorized = false;
        self.pending = PendingAuth::None;

        let session = match self.platform.connect().await {
            Ok(session) => session,
            Err(error) => {
                log::error!("connect for login failed: {error}");
                self.respond(Response::CodeSent {
                    success: false,
                    message: None,
                    error: Some(friendly_code_error(&error)),
                });
                return;
            }
        };

        match session.request_login_code(phone).await {
            Ok(()) => {
                self.session = Some(session);
                self.pending = PendingAuth::CodePending;
                log::info!("login code requested for {phone}");
                self.respond(Response::CodeSent {
                    success: true,
                    message: Some("验证码已发送".to_string()),
                    error: None,
                });
            }
            Err(error) => {
                let _ = session.disconnect().await;
                log::error!("login code request failed: {error}");
                self.respond(Response::CodeSent {
                    success: false,
                    message: None,
                    error: Some(friendly_code_error(&error)),
                });
            }
        }
    }

    /// Handle `verify_code`: the code step, then the password step when the
    /// account has a second factor
    pub(super) async fn verify_code(&mut self, code: &str, password: Option<&str>) {
        let Some(session) = self.session.clone() else {
            self.respond(Response::VerifyResponse {
                success: false,
                message: None,
                error: Some("未连接".to_string()),
            });
            return;
        };

        // The code already passed in an earlier round trip; only the
        // password is outstanding.
        if self.pending == PendingAuth::PasswordPending {
            if let Some(password) = password {
                self.verify_password(&session, password).await;
            } else {
                self.respond(Response::VerifyResponse {
                    success: false,
                    message: None,
                    error: Some("需要二次密码".to_string()),
                });
            }
            return;
        }

        match session.sign_in_code(code).await {
            Ok(()) => {
                self.authorized = true;
                self.pending = PendingAuth::None;
                log::info!("signed in");
                self.respond(Response::VerifyResponse {
                    success: true,
                    message: Some("登录成功".to_string()),
                    error: None,
                });
            }
            Err(PlatformError::PasswordRequired) => {
                log::info!("login code accepted, second factor required");
                self.pending = PendingAuth::PasswordPending;
                if let Some(password) = password {
                    self.verify_password(&session, password).await;
                } else {
                    self.respond(Response::VerifyResponse {
                        success: false,
                        message: Some("验证码正确，请输入二次密码".to_string()),
                        error: Some("need_password".to_string()),
                    });
                }
            }
            Err(PlatformError::InvalidPassword) => {
                log::error!("second factor rejected");
                self.respond(Response::VerifyResponse {
                    success: false,
                    message: None,
                    error: Some("二次密码错误".to_string()),
                });
            }
            Err(error) => {
                log::error!("sign-in failed: {error}");
                self.respond(Response::VerifyResponse {
                    success: false,
                    message: None,
                    error: Some(error.to_string()),
                });
            }
        }
    }

    async fn verify_password(&mut self, session: &P::Session, password: &str) {
        match session.sign_in_password(password).await {
            Ok(()) => {
                self.authorized = true;
                self.pending = PendingAuth::None;
                log::info!("signed in with second factor");
                self.respond(Response::VerifyResponse {
                    success: true,
                    message: Some("登录成功".to_string()),
                    error: None,
                });
            }
            Err(PlatformError::InvalidPassword) => {
                log::error!("second factor rejected");
                self.respond(Response::VerifyResponse {
                    success: false,
                    message: None,
                    error: Some("二次密码错误".to_string()),
                });
            }
            Err(error) => {
                log::error!("second factor sign-in failed: {error}");
                self.respond(Response::VerifyResponse {
                    success: false,
                    message: None,
                    error: Some(format!("登录失败: {error}")),
                });
            }
        }
    }
}
