use std::collections::HashMap;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::model::{
    Designation, GenerationParams, ImagePayload, LessonPlan, LessonPlanUpdate, ACTIVITY_SLOTS,
};
use crate::richtext::RichTextField;

/// Wire names of every prose field the form edits through a rich-text
/// surface: the two instructional-plan fields plus the ten activity slots.
pub fn prose_field_names() -> Vec<&'static str> {
    let mut names = vec!["learningOutcomes", "teachingAids"];
    names.extend(ACTIVITY_SLOTS.iter().map(|(slot, _)| *slot));
    names
}

fn mime_for_extension(path: &str) -> Option<&'static str> {
    let ext = path.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

fn strip_data_url_prefix(data: &str) -> &str {
    if data.starts_with("data:") {
        match data.find(',') {
            Some(idx) => &data[idx + 1..],
            None => data,
        }
    } else {
        data
    }
}

/// The editable form: one local copy of the full parameter set. Scalars
/// live in `base`; prose lives in the per-field state machines, which is
/// what keeps an external overwrite from corrupting an in-progress edit.
/// Every mutation is followed by a whole-set snapshot upstream, never a
/// diff.
pub struct EditableForm {
    base: LessonPlan,
    fields: HashMap<&'static str, RichTextField>,
    image: Option<ImagePayload>,
    textbook_text: String,
}

impl Default for EditableForm {
    fn default() -> Self {
        let mut fields = HashMap::new();
        for name in prose_field_names() {
            fields.insert(name, RichTextField::default());
        }
        EditableForm {
            base: LessonPlan::default(),
            fields,
            image: None,
            textbook_text: String::new(),
        }
    }
}

impl EditableForm {
    pub fn field(&self, name: &str) -> Option<&RichTextField> {
        self.fields.get(name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut RichTextField> {
        self.fields.get_mut(name)
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn textbook_text(&self) -> &str {
        &self.textbook_text
    }

    /// Scalar edit by wire name. Designation values are validated against
    /// the two allowed titles.
    pub fn set_scalar(&mut self, name: &str, value: &str) -> Result<(), String> {
        match name {
            "schoolName" => self.base.school_name = value.to_string(),
            "schoolAddress" => self.base.school_address = value.to_string(),
            "teacherName" => self.base.teacher_name = value.to_string(),
            "teacherDesignation" => {
                self.base.teacher_designation = Designation::parse(value).ok_or_else(|| {
                    "teacherDesignation must be one of: Assistant Teacher, Head Teacher".to_string()
                })?;
            }
            "topic" => self.base.topic = value.to_string(),
            "gradeLevel" => self.base.grade_level = value.to_string(),
            "unit" => self.base.unit = value.to_string(),
            "lessonNo" => self.base.lesson_no = value.to_string(),
            "sessionNo" => self.base.session_no = value.to_string(),
            "pageNo" => self.base.page_no = value.to_string(),
            "duration" => self.base.duration = value.to_string(),
            _ => return Err(format!("unknown scalar field: {}", name)),
        }
        Ok(())
    }

    /// Batch partial edit: scalar fields merge into the base while prose
    /// fields route through their state machines, so an update landing
    /// mid-edit parks instead of clobbering the draft.
    pub fn apply_update(&mut self, mut update: LessonPlanUpdate) {
        if let Some(v) = update.learning_outcomes.take() {
            if let Some(f) = self.fields.get_mut("learningOutcomes") {
                f.set_content(&v);
            }
        }
        if let Some(v) = update.teaching_aids.take() {
            if let Some(f) = self.fields.get_mut("teachingAids") {
                f.set_content(&v);
            }
        }
        if let Some(acts) = update.activities.take() {
            for (slot, value) in acts.into_pairs() {
                if let Some(f) = self.fields.get_mut(slot) {
                    f.set_content(&value);
                }
            }
        }
        update.apply_to(&mut self.base);
    }

    /// Attach a textbook image from disk. An unrecognized file type is
    /// silently ignored (no state change); only a failed read is an error,
    /// and it stays local to this call.
    pub fn attach_image_path(&mut self, path: &str) -> Result<bool> {
        let Some(mime) = mime_for_extension(path) else {
            return Ok(false);
        };
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path))?;
        self.image = Some(ImagePayload {
            data: BASE64.encode(bytes),
            mime_type: mime.to_string(),
        });
        Ok(true)
    }

    /// Attach an already-encoded image payload (the host read the file).
    /// Non-image MIME types are silently ignored.
    pub fn attach_image_data(&mut self, data: &str, mime_type: &str) -> bool {
        if !mime_type.starts_with("image/") {
            return false;
        }
        self.image = Some(ImagePayload {
            data: strip_data_url_prefix(data).to_string(),
            mime_type: mime_type.to_string(),
        });
        true
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn set_textbook_text(&mut self, text: &str) {
        self.textbook_text = text.to_string();
    }

    /// The entire current plan, scalars plus the committed content of every
    /// prose field.
    pub fn snapshot_plan(&self) -> LessonPlan {
        let mut plan = self.base.clone();
        if let Some(f) = self.fields.get("learningOutcomes") {
            plan.learning_outcomes = f.content().to_string();
        }
        if let Some(f) = self.fields.get("teachingAids") {
            plan.teaching_aids = f.content().to_string();
        }
        for (slot, _) in ACTIVITY_SLOTS {
            if let (Some(field), Some(target)) =
                (self.fields.get(slot), plan.activities.get_mut(slot))
            {
                *target = field.content().to_string();
            }
        }
        plan
    }

    /// The full generation request input: the plan plus the transient
    /// attachments that never enter the canonical document.
    pub fn snapshot_params(&self) -> GenerationParams {
        GenerationParams {
            plan: self.snapshot_plan(),
            image: self.image.clone(),
            textbook_text: self.textbook_text.clone(),
        }
    }

    /// External overwrite of the whole form (a generation result). Scalars
    /// apply directly; prose goes through each field's state machine so a
    /// focused field parks the new value until blur.
    pub fn apply_external_plan(&mut self, plan: &LessonPlan) {
        let mut base = plan.clone();
        // Prose mirrors in `base` are dead weight; the fields own them.
        base.learning_outcomes = String::new();
        base.teaching_aids = String::new();
        base.activities = Default::default();
        self.base = base;

        if let Some(f) = self.fields.get_mut("learningOutcomes") {
            f.set_content(&plan.learning_outcomes);
        }
        if let Some(f) = self.fields.get_mut("teachingAids") {
            f.set_content(&plan.teaching_aids);
        }
        for (slot, _) in ACTIVITY_SLOTS {
            let value = plan.activities.get(slot).unwrap_or_default().to_string();
            if let Some(f) = self.fields.get_mut(slot) {
                f.set_content(&value);
            }
        }
    }

    pub fn reset(&mut self) {
        *self = EditableForm::default();
    }
}
