//! Server-rendered pages. The app has a fixed set of views, so these are
//! plain formatted strings rather than a template engine.

use crate::users::User;

pub const ADMIN_PRIVILEGE_ERROR: &str = "You don't have the required admin privileges.";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn landing(is_auth: bool) -> String {
    let nav = if is_auth {
        "<a href=\"/members\">Members</a> \
         <form method=\"post\" action=\"/logout\"><button type=\"submit\">Log out</button></form>"
    } else {
        "<a href=\"/login\">Log in</a> <a href=\"/register\">Register</a>"
    };
    page(
        "Welcome",
        &format!("<h1>Welcome</h1>\n<nav>{nav}</nav>"),
    )
}

pub fn login_page(err: &str) -> String {
    let error_html = if err.is_empty() {
        String::new()
    } else {
        format!("<p class=\"error\">{}</p>\n", escape(err))
    };
    page(
        "Log in",
        &format!(
            "<h1>Log in</h1>\n{error_html}\
             <form method=\"post\" action=\"/login\">\n\
             <label>Email <input type=\"email\" name=\"email\" required></label>\n\
             <label>Password <input type=\"password\" name=\"password\" required></label>\n\
             <button type=\"submit\">Log in</button>\n\
             </form>\n\
             <p><a href=\"/register\">Need an account? Register</a></p>"
        ),
    )
}

pub fn register_page(err: &str) -> String {
    let error_html = if err.is_empty() {
        String::new()
    } else {
        format!("<p class=\"error\">{}</p>\n", escape(err))
    };
    page(
        "Register",
        &format!(
            "<h1>Register</h1>\n{error_html}\
             <form method=\"post\" action=\"/register\">\n\
             <label>Username <input type=\"text\" name=\"username\" required></label>\n\
             <label>Email <input type=\"email\" name=\"email\" required></label>\n\
             <label>Password <input type=\"password\" name=\"password\" required></label>\n\
             <button type=\"submit\">Register</button>\n\
             </form>\n\
             <p><a href=\"/login\">Already registered? Log in</a></p>"
        ),
    )
}

pub fn members_page(username: &str, image: &str) -> String {
    let greeting = if username.is_empty() {
        String::from("<h1>Members area</h1>\n")
    } else {
        format!("<h1>Members area</h1>\n<p>Logged in as {}</p>\n", escape(username))
    };
    page(
        "Members",
        &format!(
            "{greeting}\
             <img src=\"/public/{}\" alt=\"member image\">\n\
             <form method=\"post\" action=\"/logout\"><button type=\"submit\">Log out</button></form>",
            escape(image)
        ),
    )
}

/// The admin view doubles as the privilege-error page: the admin guard
/// renders it in place (no redirect) with an error and an empty user list.
pub fn admin_page(users: &[User], is_auth: bool, error: Option<&str>) -> String {
    let mut body = String::from("<h1>Admin</h1>\n");
    if let Some(err) = error {
        body.push_str(&format!("<p class=\"error\">{}</p>\n", escape(err)));
    } else {
        body.push_str("<table>\n<tr><th>Username</th><th>Email</th><th>Role</th><th></th></tr>\n");
        for user in users {
            let (role, action, label) = if user.is_admin {
                ("admin", "demote", "Demote")
            } else {
                ("user", "promote", "Promote")
            };
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td>\
                 <td><form method=\"post\" action=\"/{}/{}\"><button type=\"submit\">{}</button></form></td></tr>\n",
                escape(&user.username),
                escape(&user.email),
                role,
                action,
                user.id,
                label
            ));
        }
        body.push_str("</table>\n");
    }
    let back = if is_auth {
        "<p><a href=\"/members\">Back to members</a></p>"
    } else {
        "<p><a href=\"/login\">Log in</a></p>"
    };
    body.push_str(back);
    page("Admin", &body)
}

pub fn not_found() -> String {
    page(
        "Not found",
        "<h1>404</h1>\n<p>The page you were looking for does not exist.</p>\n<p><a href=\"/\">Home</a></p>",
    )
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;

    fn sample_user(username: &str, email: &str, is_admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            is_admin,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
        );
        assert_eq!(escape("a&b\"c"), "a&amp;b&quot;c");
    }

    #[test]
    fn admin_page_lists_users_and_escapes_them() {
        let users = vec![
            sample_user("<bob>", "bob@example.com", false),
            sample_user("alice", "alice@example.com", true),
        ];
        let html = admin_page(&users, true, None);
        assert!(html.contains("&lt;bob&gt;"));
        assert!(!html.contains("<bob>"));
        assert!(html.contains("alice@example.com"));
        assert!(html.contains(&format!("/promote/{}", users[0].id)));
        assert!(html.contains(&format!("/demote/{}", users[1].id)));
    }

    #[test]
    fn admin_page_error_variant_hides_user_list() {
        let users = vec![sample_user("alice", "alice@example.com", true)];
        let html = admin_page(&users, true, Some(ADMIN_PRIVILEGE_ERROR));
        // the apostrophe in the message is entity-escaped on the way out
        assert!(html.contains("required admin privileges."));
        assert!(!html.contains("alice@example.com"));
    }

    #[test]
    fn login_page_shows_error_only_when_present() {
        assert!(!login_page("").contains("class=\"error\""));
        assert!(login_page("Email or Password does not match.")
            .contains("Email or Password does not match."));
    }

    #[test]
    fn landing_varies_with_auth_state() {
        assert!(landing(false).contains("/login"));
        assert!(landing(true).contains("/logout"));
    }

    #[test]
    fn not_found_mentions_404() {
        assert!(not_found().contains("404"));
    }
}
