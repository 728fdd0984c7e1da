//! Static HTML pages served by the gateway.

pub const SIGN_IN: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in</title></head>
<body>
  <h1>Sign in</h1>
  <form method="post" action="/auth/signin">
    <label for="email">Email address</label>
    <input id="email" name="email" type="email" required autofocus>
    <button type="submit">Send sign-in link</button>
  </form>
</body>
</html>
"#;

/// Shown right after a sign-in link was requested.
pub const LINK_SENT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Link sent</title></head>
<body>
  <h1>Link sent</h1>
  <p>We sent you a login link. Open it on this device to sign in.</p>
  <p><a href="/auth/signin">Use a different address</a></p>
</body>
</html>
"#;

/// Landing page for pending or declined sign-ins.
pub const CHECK_EMAIL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Check your email</title></head>
<body>
  <h1>Check your email</h1>
  <p>A sign-in link has been sent to your email address.</p>
</body>
</html>
"#;

/// Shell for the phone client. It loads `/api/token` once signed in.
pub const PHONE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Voice</title></head>
<body>
  <h1>Voice</h1>
  <p id="status">Fetching access token...</p>
  <form id="dial">
    <input id="to" name="to" type="tel" placeholder="+15551234567">
    <button type="submit">Call</button>
  </form>
  <form method="post" action="/auth/signout">
    <button type="submit">Sign out</button>
  </form>
</body>
</html>
"#;
