use super::*;

const INTERN_FORM: &str = r#"
<h5>Intern</h5>
<form method="post" action="/interns/5/edit/" enctype="multipart/form-data" novalidate>
  <input type="hidden" name="csrfmiddlewaretoken" value="tok&amp;en">
  <input type="text" name="last_name" value="Durand" maxlength="100">
  <input name="first_name" value='Alice'>
  <input type="email" name="email" value="alice@example.org" disabled>
  <input type="checkbox" name="active" checked>
  <input type="checkbox" name="archived" value="yes">
  <input type="radio" name="level" value="L3">
  <input type="radio" name="level" value="M1" checked>
  <input type="file" name="resume">
  <textarea name="notes">
First line &lt;b&gt;</textarea>
  <select name="company">
    <option value="">---------</option>
    <option value="3" selected>ACME</option>
  </select>
  <select name="skills" multiple>
    <option value="rust" selected>Rust</option>
    <option value="sql">SQL</option>
    <option selected>Git</option>
  </select>
  <button type="submit">Save</button>
  <input type="submit" name="save" value="Save">
</form>
"#;

#[test]
fn fragment_without_form_has_no_form() {
    assert!(find_form("<p>Are you sure?</p>").is_none());
    assert!(find_form("").is_none());
}

#[test]
fn reads_action_and_method() {
    let form = find_form(INTERN_FORM).expect("form");
    assert_eq!(form.action.as_deref(), Some("/interns/5/edit/"));
    assert_eq!(form.method.as_deref(), Some("post"));
}

#[test]
fn blank_action_and_missing_method_are_absent() {
    let form = find_form(r#"<form action=""><input name="x" value="1"></form>"#).expect("form");
    assert_eq!(form.action, None);
    assert_eq!(form.method, None);
    assert_eq!(form.fields.get_text("x"), Some("1"));
}

#[test]
fn collects_successful_fields_in_document_order() {
    let form = find_form(INTERN_FORM).expect("form");
    let names: Vec<&str> = form.fields.iter().map(|(name, _)| name).collect();
    assert_eq!(
        names,
        vec![
            "csrfmiddlewaretoken",
            "last_name",
            "first_name",
            "active",
            "level",
            "resume",
            "notes",
            "company",
            "skills",
            "skills",
        ]
    );
}

#[test]
fn decodes_values_and_applies_control_defaults() {
    let fields = find_form(INTERN_FORM).expect("form").fields;
    assert_eq!(fields.csrf_token(), Some("tok&en"));
    assert_eq!(fields.get_text("first_name"), Some("Alice"));
    assert_eq!(fields.get_text("active"), Some("on"));
    assert_eq!(fields.get_text("level"), Some("M1"));
    assert_eq!(fields.get_text("notes"), Some("First line <b>"));
    assert_eq!(fields.get_text("company"), Some("3"));
    let skills: Vec<_> = fields.get_all("skills").filter_map(FieldValue::as_text).collect();
    assert_eq!(skills, vec!["rust", "Git"]);
    assert_eq!(fields.get("resume"), Some(&FieldValue::File(FilePart::empty())));
}

#[test]
fn single_select_without_selection_uses_first_option() {
    let form = find_form(
        r#"<form><select name="status"><option value="draft">Draft</option><option value="done">Done</option></select></form>"#,
    )
    .expect("form");
    assert_eq!(form.fields.get_text("status"), Some("draft"));
}

#[test]
fn unterminated_form_still_yields_fields() {
    let form = find_form(r#"<FORM METHOD="GET"><input name="q" value="intern">"#).expect("form");
    assert_eq!(form.method.as_deref(), Some("GET"));
    assert_eq!(form.fields.get_text("q"), Some("intern"));
}

#[test]
fn only_the_first_form_is_bound() {
    let form = find_form(
        r#"<form action="/a/"><input name="a" value="1"></form><form action="/b/"><input name="b" value="2"></form>"#,
    )
    .expect("form");
    assert_eq!(form.action.as_deref(), Some("/a/"));
    assert!(form.fields.get("b").is_none());
}

#[test]
fn commented_out_form_is_not_a_form() {
    assert!(find_form(r#"<!-- <form action="/old/"></form> --><p>No form here.</p>"#).is_none());
}

#[test]
fn commented_out_controls_are_not_submitted() {
    let form = find_form(
        r#"<form method="post">
  <!-- <input name="legacy" value="x"> -->
  <input name="last_name" value="Durand">
  <!--
  <select name="old_company"><option value="1" selected>Old</option></select>
  -->
</form>"#,
    )
    .expect("form");
    assert!(form.fields.get("legacy").is_none());
    assert!(form.fields.get("old_company").is_none());
    assert_eq!(form.fields.get_text("last_name"), Some("Durand"));
    assert_eq!(form.fields.len(), 1);
}

#[test]
fn quoted_angle_brackets_stay_inside_attributes() {
    let form = find_form(
        r#"<form method="post" data-x="a>b" action="/ok/">
  <input data-hint='1 > 0' name="count" value="3">
  <textarea data-rule="len>2" name="notes">kept</textarea>
  <select data-rule="x>y" name="level"><option data-label="a>b" value="M1" selected>M1</option></select>
</form>"#,
    )
    .expect("form");
    assert_eq!(form.action.as_deref(), Some("/ok/"));
    assert_eq!(form.method.as_deref(), Some("post"));
    assert_eq!(form.fields.get_text("count"), Some("3"));
    assert_eq!(form.fields.get_text("notes"), Some("kept"));
    assert_eq!(form.fields.get_text("level"), Some("M1"));
}

#[test]
fn numeric_entities_decode() {
    assert_eq!(decode_entities("l&#39;&#x00e9;cole &unknown;"), "l'école &unknown;");
}

#[test]
fn escape_html_neutralizes_markup() {
    assert_eq!(
        escape_html(r#"<script>"x" & 'y'</script>"#),
        "&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;"
    );
}
