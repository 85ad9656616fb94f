//! Server-rendered HTML pages.

use crate::notice::Notice;
use std::fmt::Write;
use student_store::StudentRecord;

/// Values shown on the confirmation page.
#[derive(Debug, Default)]
pub struct Confirmation<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub course: &'a str,
}

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, notices: &[Notice], body: &str) -> String {
    let mut alerts = String::new();
    for notice in notices {
        let _ = writeln!(
            alerts,
            r#"<div class="alert alert-{}">{}</div>"#,
            notice.level.as_str(),
            escape(&notice.message)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Student Portal</title>
</head>
<body>
<nav><a href="/">Home</a> | <a href="/register">Register</a> | <a href="/students">Students</a></nav>
<main>
{alerts}{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

pub fn home(notices: &[Notice]) -> String {
    layout(
        "Home",
        notices,
        r#"<h1>Welcome to the Student Portal</h1>
<p>Register for a course or browse current registrations.</p>
<p><a href="/register">Register now</a></p>"#,
    )
}

/// The registration form. Always rendered empty.
pub fn register_form(notices: &[Notice]) -> String {
    layout(
        "Register",
        notices,
        r#"<h1>Student Registration</h1>
<form method="post" action="/register">
<label>First name <input type="text" name="firstName" required></label>
<label>Last name <input type="text" name="lastName" required></label>
<label>Email <input type="email" name="email" required></label>
<label>Phone <input type="tel" name="phone" pattern="[0-9]{10}" required></label>
<label>Course <input type="text" name="course" required></label>
<button type="submit">Register</button>
</form>"#,
    )
}

pub fn confirmation(details: &Confirmation<'_>, notices: &[Notice]) -> String {
    let body = format!(
        r#"<h1>Registration Confirmed</h1>
<dl>
<dt>Name</dt><dd>{} {}</dd>
<dt>Email</dt><dd>{}</dd>
<dt>Course</dt><dd>{}</dd>
</dl>
<p><a href="/students">View all students</a></p>"#,
        escape(details.first_name),
        escape(details.last_name),
        escape(details.email),
        escape(details.course),
    );
    layout("Confirmation", notices, &body)
}

pub fn students(records: &[StudentRecord], notices: &[Notice]) -> String {
    let mut body = String::from("<h1>Registered Students</h1>\n");

    if records.is_empty() {
        body.push_str("<p>No students registered yet.</p>\n");
    }

    body.push_str(
        "<table>\n<thead><tr><th>ID</th><th>Name</th><th>Email</th><th>Phone</th><th>Course</th><th>Registered</th></tr></thead>\n<tbody>\n",
    );
    for record in records {
        let _ = writeln!(
            body,
            r#"<tr class="student"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
            record.id,
            escape(&record.full_name()),
            escape(&record.email),
            escape(&record.phone),
            escape(&record.course),
            record.registered_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    body.push_str("</tbody>\n</table>");

    layout("Students", notices, &body)
}

pub fn not_found() -> String {
    layout(
        "Page Not Found",
        &[],
        r#"<h1>404 - Page Not Found</h1>
<p>The page you are looking for does not exist. <a href="/">Go home</a></p>"#,
    )
}

pub fn internal_error(notices: &[Notice]) -> String {
    layout(
        "Server Error",
        notices,
        r#"<h1>500 - Internal Server Error</h1>
<p>Something went wrong on our side. <a href="/">Go home</a></p>"#,
    )
}
