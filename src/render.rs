use serde_json::{json, Value};

use crate::model::LessonPlan;
use crate::richtext::is_empty_fragment;

/// Activity rows in document order: wire slot, printed label, optional.
/// Optional rows disappear entirely when empty; required rows keep their
/// cell with an explicit placeholder so the printed table never loses
/// structure.
const ACTIVITY_ROWS: [(&str, &str, bool); 10] = [
    ("introduction", "Introduction", false),
    ("reviewPriorKnowledge", "Prior Knowledge", true),
    ("reviewPreviousSession", "Previous Session", true),
    ("presentation", "Presentation", false),
    ("practice", "Practice Activities", false),
    ("assessment", "Assessment", false),
    ("homework", "Homework", true),
    ("feedback", "Feedback", false),
    ("summary", "Summary", false),
    ("concluding", "Concluding", false),
];

pub const EMPTY_PLACEHOLDER: &str = "[Empty]";

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn or_na(value: &str) -> String {
    if value.trim().is_empty() {
        "N/A".to_string()
    } else {
        escape(value)
    }
}

fn section_row(out: &mut String, title: &str) {
    out.push_str(&format!(
        "<tr class=\"section-row\"><td colspan=\"2\">{}</td></tr>",
        escape(title)
    ));
}

/// One label/value table row. Prose values are inserted as-is (the field
/// contract restricts them to bold/italic/bullets; the renderer does not
/// re-validate). Returns nothing for an empty optional row.
fn prose_row(out: &mut String, label: &str, html: &str, optional: bool) {
    if is_empty_fragment(html) {
        if optional {
            return;
        }
        out.push_str(&format!(
            "<tr class=\"plan-row\"><td class=\"row-label\">{}</td>\
             <td class=\"row-value row-empty\">{}</td></tr>",
            escape(label),
            EMPTY_PLACEHOLDER
        ));
        return;
    }
    out.push_str(&format!(
        "<tr class=\"plan-row\"><td class=\"row-label\">{}</td>\
         <td class=\"row-value\"><div class=\"rich-text-content\">{}</div></td></tr>",
        escape(label),
        html
    ));
}

fn detail(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!(
        "<div><span class=\"detail-label\">{}:</span> {}</div>",
        label,
        or_na(value)
    ));
}

/// Pure function from a (possibly partial) plan to the printable document.
/// Fixed section order; never mutates the model.
pub fn render_document(plan: &LessonPlan) -> String {
    let mut out = String::new();
    out.push_str("<div id=\"printable-area\" class=\"plan-document\">");

    let school_name = if plan.school_name.trim().is_empty() {
        "Name of School"
    } else {
        plan.school_name.as_str()
    };
    let school_address = if plan.school_address.trim().is_empty() {
        "School Address"
    } else {
        plan.school_address.as_str()
    };
    out.push_str(&format!(
        "<div class=\"plan-header\"><h1>{}</h1><p>{}</p>\
         <div class=\"plan-badge\">Daily Lesson Plan</div></div>",
        escape(school_name),
        escape(school_address)
    ));

    out.push_str("<table class=\"plan-table\"><tbody>");

    section_row(&mut out, "Teacher Introduction");
    prose_row(&mut out, "Teacher\u{2019}s Name", &escape(&plan.teacher_name), false);
    prose_row(
        &mut out,
        "Designation",
        plan.teacher_designation.as_str(),
        false,
    );

    section_row(&mut out, "Lesson Introduction");
    out.push_str(
        "<tr class=\"plan-row\"><td class=\"row-label\">Lesson Details</td>\
         <td class=\"row-value\"><div class=\"detail-grid\">",
    );
    detail(&mut out, "Class", &plan.grade_level);
    detail(&mut out, "Session", &plan.session_no);
    detail(&mut out, "Session Duration", &plan.duration);
    detail(&mut out, "Unit", &plan.unit);
    detail(&mut out, "Lesson", &plan.lesson_no);
    detail(&mut out, "Page", &plan.page_no);
    out.push_str("</div></td></tr>");

    section_row(&mut out, "Instructional Design");
    prose_row(&mut out, "Learning Outcomes", &plan.learning_outcomes, false);
    prose_row(&mut out, "Teaching Aids", &plan.teaching_aids, false);

    section_row(&mut out, "Teaching Learning Activity");
    for (slot, label, optional) in ACTIVITY_ROWS {
        let value = plan.activities.get(slot).unwrap_or_default();
        prose_row(&mut out, label, value, optional);
    }

    out.push_str("</tbody></table>");
    out.push_str(
        "<div class=\"plan-signatures\">\
         <div class=\"signature\">Teacher's Signature</div>\
         <div class=\"signature\">Headteacher's Signature</div>\
         </div>",
    );
    out.push_str("</div>");
    out
}

/// The two presentation modes. Both wrap the byte-identical document block;
/// only the surrounding chrome differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewMode {
    Inline,
    Export,
}

impl PreviewMode {
    pub fn parse(raw: &str) -> Option<PreviewMode> {
        match raw {
            "inline" => Some(PreviewMode::Inline),
            "export" => Some(PreviewMode::Export),
            _ => None,
        }
    }
}

pub fn render_preview(plan: &LessonPlan, mode: PreviewMode) -> String {
    let document = render_document(plan);
    match mode {
        PreviewMode::Inline => format!(
            "<div class=\"preview-inline\" aria-hidden=\"true\">{}</div>",
            document
        ),
        PreviewMode::Export => format!(
            "<div class=\"preview-overlay\">\
             <div class=\"preview-controls\">\
             <button class=\"back-to-editor\">Back to Editor</button>\
             <button class=\"print-action\">Print</button>\
             <button class=\"pdf-action\">Download PDF</button>\
             </div>\
             <div class=\"preview-paper\">{}</div>\
             </div>",
            document
        ),
    }
}

/// Descriptor for the host's native print path.
pub fn print_options() -> Value {
    json!({
        "pageSize": "A4",
        "orientation": "portrait",
        "marginCm": 1,
        "printBackground": true,
    })
}

/// Descriptor for the host's client-side PDF rasterization of the preview
/// document.
pub fn pdf_options(plan: &LessonPlan) -> Value {
    let topic = plan.topic.trim();
    let filename = format!(
        "Lesson_Plan_{}.pdf",
        if topic.is_empty() { "Export" } else { topic }
    );
    json!({
        "filename": filename,
        "marginMm": 10,
        "pageSize": "a4",
        "orientation": "portrait",
        "imageQuality": 0.98,
        "pagebreak": "avoid-all",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_prose_rows_keep_a_placeholder_cell() {
        let html = render_document(&LessonPlan::default());
        // learningOutcomes, teachingAids, teacherName and the seven
        // required activity rows all render the placeholder when blank.
        assert_eq!(html.matches(EMPTY_PLACEHOLDER).count(), 10);
        assert!(html.contains("Learning Outcomes"));
        assert!(html.contains("Concluding"));
    }

    #[test]
    fn empty_optional_rows_are_omitted_entirely() {
        let html = render_document(&LessonPlan::default());
        assert!(!html.contains("Prior Knowledge"));
        assert!(!html.contains("Previous Session"));
        assert!(!html.contains("Homework"));
    }

    #[test]
    fn optional_row_appears_once_it_has_text() {
        let mut plan = LessonPlan::default();
        plan.activities.homework = "<ul><li>Read page 33</li></ul>".to_string();
        let html = render_document(&plan);
        assert!(html.contains("Homework"));
        assert!(html.contains("<ul><li>Read page 33</li></ul>"));
    }

    #[test]
    fn formatting_only_fragment_still_counts_as_empty() {
        let mut plan = LessonPlan::default();
        plan.learning_outcomes = "<div><br></div>".to_string();
        plan.activities.homework = "<br>".to_string();
        let html = render_document(&plan);
        assert_eq!(html.matches(EMPTY_PLACEHOLDER).count(), 10);
        assert!(!html.contains("Homework"));
    }

    #[test]
    fn missing_lesson_details_render_na_never_blank() {
        let mut plan = LessonPlan::default();
        plan.unit = String::new();
        plan.lesson_no = String::new();
        plan.session_no = String::new();
        plan.page_no = String::new();
        plan.grade_level = String::new();
        plan.duration = String::new();
        let html = render_document(&plan);
        assert_eq!(html.matches("N/A").count(), 6);
    }

    #[test]
    fn header_falls_back_to_generic_school_identity() {
        let html = render_document(&LessonPlan::default());
        assert!(html.contains("Name of School"));
        assert!(html.contains("School Address"));
        assert!(html.contains("Daily Lesson Plan"));

        let mut plan = LessonPlan::default();
        plan.school_name = "Sunrise Primary".to_string();
        assert!(render_document(&plan).contains("Sunrise Primary"));
    }

    #[test]
    fn scalar_values_are_escaped() {
        let mut plan = LessonPlan::default();
        plan.teacher_name = "A <b>bold</b> name".to_string();
        let html = render_document(&plan);
        assert!(html.contains("A &lt;b&gt;bold&lt;/b&gt; name"));
    }

    #[test]
    fn both_modes_wrap_the_identical_document_block() {
        let mut plan = LessonPlan::default();
        plan.topic = "Fruits".to_string();
        plan.learning_outcomes = "<b>Outcomes</b>".to_string();
        let document = render_document(&plan);
        let inline = render_preview(&plan, PreviewMode::Inline);
        let export = render_preview(&plan, PreviewMode::Export);
        assert!(inline.contains(&document));
        assert!(export.contains(&document));
        assert_ne!(inline, export);
    }

    #[test]
    fn pdf_filename_uses_the_topic_with_a_fallback() {
        let mut plan = LessonPlan::default();
        assert_eq!(pdf_options(&plan)["filename"], "Lesson_Plan_Export.pdf");
        plan.topic = "Fruits".to_string();
        assert_eq!(pdf_options(&plan)["filename"], "Lesson_Plan_Fruits.pdf");
        assert_eq!(pdf_options(&plan)["pageSize"], "a4");
    }
}
