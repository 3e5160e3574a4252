use serde_json::{json, Value};

use crate::model::{
    Designation, GenerationParams, ImagePayload, LessonActivities, LessonPlan, ACTIVITY_SLOTS,
};
use crate::richtext::is_empty_fragment;

const GEMINI_MODEL: &str = "gemini-3-flash-preview";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// The single user-visible failure banner. Internal detail never leaks to
/// the caller; it only travels inside `GenerateError` for the envelope code.
pub const GENERATION_FAILED_MESSAGE: &str =
    "AI Generation failed. Check textbook info or image clarity.";

#[derive(Debug, Clone)]
pub struct GenerateError {
    pub code: String,
    pub message: String,
}

impl GenerateError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        GenerateError {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

const SLOT_GUIDANCE: [(&str, &str); 10] = [
    ("introduction", "Hook/Motivation."),
    ("reviewPriorKnowledge", "Connecting to life."),
    ("reviewPreviousSession", "Recapping."),
    ("presentation", "Core instruction."),
    ("practice", "Active tasks."),
    ("assessment", "Check understanding."),
    ("homework", "Simple follow-up."),
    ("feedback", "Scaffolding/Correction."),
    ("summary", "Wrap up."),
    ("concluding", "Closing ritual."),
];

/// Builds the natural-language instruction sent to the generator:
/// curriculum context, the requested document structure, the HTML-only
/// formatting constraint, plus whatever the user already supplied as hints.
pub fn build_prompt(params: &GenerationParams) -> String {
    let plan = &params.plan;
    let mut prompt = String::new();
    prompt.push_str(
        "Generate a professional Daily Lesson Plan for Primary English (Bangladesh).\n\
         Curriculum: NCTB (National Curriculum and Textbook Board) \"English for Today\".\n\
         Language: English.\n\n",
    );
    prompt.push_str("Context:\n");
    prompt.push_str(&format!("- Topic: {}\n", plan.topic));
    prompt.push_str(&format!("- Grade: {}\n", plan.grade_level));
    prompt.push_str(&format!(
        "- Unit: {}, Lesson: {}, Session: {}\n",
        plan.unit, plan.lesson_no, plan.session_no
    ));
    prompt.push_str(&format!("- Duration: {}\n", plan.duration));

    if !params.textbook_text.trim().is_empty() {
        prompt.push_str(&format!("\nTextbook Text: \"{}\"\n", params.textbook_text.trim()));
    }

    let hints: Vec<String> = ACTIVITY_SLOTS
        .iter()
        .filter_map(|&(slot, _)| {
            let value = plan.activities.get(slot)?;
            if is_empty_fragment(value) {
                None
            } else {
                Some(format!("- {}: {}", slot, value))
            }
        })
        .collect();
    if !hints.is_empty() {
        prompt.push_str("\nUser Provided Activity Notes (Integrate these into the plan):\n");
        prompt.push_str(&hints.join("\n"));
        prompt.push('\n');
    }

    if params.image.is_some() {
        prompt.push_str("\nAnalyze the attached textbook image to ensure pedagogical alignment.\n");
    }

    prompt.push_str(
        "\nFORMATTING REQUIREMENT:\n\
         For 'learningOutcomes', 'teachingAids', and all 'activities' fields, you MUST return the \
         content using basic HTML tags for rich formatting:\n\
         - Use <b>...</b> for bold.\n\
         - Use <i>...</i> for italics.\n\
         - Use <ul><li>...</li></ul> for bullet points.\n\
         - Do NOT use Markdown. Use only valid simple HTML.\n\n\
         Structure Requirements:\n\
         1. Learning Outcomes: Specific competencies from the NCTB curriculum.\n\
         2. Teaching Aids: Specific materials for this lesson.\n\
         3. Teaching Learning Activities:\n",
    );
    for (slot, guidance) in SLOT_GUIDANCE {
        prompt.push_str(&format!("   - {}: {}\n", slot, guidance));
    }
    prompt
}

/// The declared output shape. The backend is instructed to return exactly
/// this object; the seven non-optional activity slots are mandatory.
pub fn response_schema() -> Value {
    let mut activity_props = serde_json::Map::new();
    for (slot, _) in ACTIVITY_SLOTS {
        activity_props.insert(slot.to_string(), json!({ "type": "STRING" }));
    }
    let required: Vec<&str> = ACTIVITY_SLOTS
        .iter()
        .filter(|(_, optional)| !optional)
        .map(|(slot, _)| *slot)
        .collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "schoolName": { "type": "STRING" },
            "schoolAddress": { "type": "STRING" },
            "teacherName": { "type": "STRING" },
            "teacherDesignation": { "type": "STRING" },
            "topic": { "type": "STRING" },
            "gradeLevel": { "type": "STRING" },
            "unit": { "type": "STRING" },
            "lessonNo": { "type": "STRING" },
            "sessionNo": { "type": "STRING" },
            "pageNo": { "type": "STRING" },
            "duration": { "type": "STRING" },
            "learningOutcomes": { "type": "STRING" },
            "teachingAids": { "type": "STRING" },
            "activities": {
                "type": "OBJECT",
                "properties": Value::Object(activity_props),
                "required": required,
            }
        }
    })
}

/// One logical backend operation: prompt + optional image + declared schema
/// in, structured JSON out. Implemented by the Gemini REST backend in
/// production and by stubs in tests.
pub trait GenerationBackend {
    fn generate_content(
        &self,
        prompt: &str,
        image: Option<&ImagePayload>,
        schema: &Value,
    ) -> Result<Value, GenerateError>;
}

/// Gemini `generateContent` over blocking HTTPS. The only configuration is
/// the access credential from the environment.
pub struct GeminiBackend {
    api_key: Option<String>,
    base_url: String,
}

impl GeminiBackend {
    pub fn from_env() -> Self {
        GeminiBackend {
            api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }
}

fn strip_data_url(data: &str) -> &str {
    if data.starts_with("data:") {
        match data.find(',') {
            Some(idx) => &data[idx + 1..],
            None => data,
        }
    } else {
        data
    }
}

impl GenerationBackend for GeminiBackend {
    fn generate_content(
        &self,
        prompt: &str,
        image: Option<&ImagePayload>,
        schema: &Value,
    ) -> Result<Value, GenerateError> {
        let Some(key) = self.api_key.as_ref() else {
            return Err(GenerateError::new(
                "missing_credential",
                format!("{} is not set", API_KEY_ENV),
            ));
        };

        let mut parts = vec![json!({ "text": prompt })];
        if let Some(image) = image {
            parts.push(json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": strip_data_url(&image.data),
                }
            }));
        }
        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }
        });

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, GEMINI_MODEL, key
        );
        let client = reqwest::blocking::Client::new();
        let response = client
            .post(&url)
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .map_err(|e| GenerateError::new("transport_failed", e.to_string()))?;
        if !response.status().is_success() {
            return Err(GenerateError::new(
                "transport_failed",
                format!("backend returned {}", response.status()),
            ));
        }
        let raw = response
            .text()
            .map_err(|e| GenerateError::new("transport_failed", e.to_string()))?;
        let envelope: Value = serde_json::from_str(&raw)
            .map_err(|e| GenerateError::new("bad_response", e.to_string()))?;
        let text = envelope
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.pointer("/content/parts/0/text"))
            .and_then(|t| t.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GenerateError::new("empty_response", "no generated text"))?;
        serde_json::from_str(text).map_err(|e| GenerateError::new("bad_response", e.to_string()))
    }
}

fn field_str(obj: &Value, key: &str, required: bool) -> Result<String, GenerateError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None if !required => Ok(String::new()),
        Some(_) => Err(GenerateError::new(
            "bad_response",
            format!("{} must be a string", key),
        )),
        None => Err(GenerateError::new(
            "bad_response",
            format!("missing {}", key),
        )),
    }
}

/// Validates the structured output against the declared shape and converts
/// it into a plan. Any deviation is a hard failure; nothing is partially
/// trusted.
pub fn parse_generated(raw: &Value) -> Result<LessonPlan, GenerateError> {
    if !raw.is_object() {
        return Err(GenerateError::new("bad_response", "output is not an object"));
    }
    let activities_raw = raw
        .get("activities")
        .ok_or_else(|| GenerateError::new("bad_response", "missing activities"))?;
    if !activities_raw.is_object() {
        return Err(GenerateError::new(
            "bad_response",
            "activities must be an object",
        ));
    }

    let mut activities = LessonActivities::default();
    for (slot, optional) in ACTIVITY_SLOTS {
        let value = field_str(activities_raw, slot, !optional)?;
        if let Some(target) = activities.get_mut(slot) {
            *target = value;
        }
    }

    let designation = match raw.get("teacherDesignation") {
        Some(Value::String(s)) => Designation::parse(s).unwrap_or_default(),
        Some(Value::Null) | None => Designation::default(),
        Some(_) => {
            return Err(GenerateError::new(
                "bad_response",
                "teacherDesignation must be a string",
            ))
        }
    };

    Ok(LessonPlan {
        school_name: field_str(raw, "schoolName", false)?,
        school_address: field_str(raw, "schoolAddress", false)?,
        teacher_name: field_str(raw, "teacherName", false)?,
        teacher_designation: designation,
        topic: field_str(raw, "topic", false)?,
        grade_level: field_str(raw, "gradeLevel", false)?,
        unit: field_str(raw, "unit", false)?,
        lesson_no: field_str(raw, "lessonNo", false)?,
        session_no: field_str(raw, "sessionNo", false)?,
        page_no: field_str(raw, "pageNo", false)?,
        duration: field_str(raw, "duration", false)?,
        learning_outcomes: field_str(raw, "learningOutcomes", true)?,
        teaching_aids: field_str(raw, "teachingAids", true)?,
        activities,
    })
}

fn prefer_user(user: &str, generated: String) -> String {
    if user.trim().is_empty() {
        generated
    } else {
        user.to_string()
    }
}

/// Field-by-field precedence between what the user typed and what the
/// generator proposed. Identity fields fall back to the generated value
/// only when the user left them blank; the six lesson-detail scalars are
/// the user's alone and are never taken from the response.
pub fn merge_with_precedence(params: &GenerationParams, generated: LessonPlan) -> LessonPlan {
    let user = &params.plan;
    LessonPlan {
        school_name: prefer_user(&user.school_name, generated.school_name),
        school_address: prefer_user(&user.school_address, generated.school_address),
        teacher_name: prefer_user(&user.teacher_name, generated.teacher_name),
        // The designation select always holds a value, so the user wins.
        teacher_designation: user.teacher_designation,
        topic: prefer_user(&user.topic, generated.topic),
        grade_level: user.grade_level.clone(),
        unit: user.unit.clone(),
        lesson_no: user.lesson_no.clone(),
        session_no: user.session_no.clone(),
        page_no: user.page_no.clone(),
        duration: user.duration.clone(),
        learning_outcomes: generated.learning_outcomes,
        teaching_aids: generated.teaching_aids,
        activities: generated.activities,
    }
}

/// The one-shot generation call: build the instruction, invoke the backend,
/// validate the structured output, merge by precedence. Not retried; every
/// failure surfaces as one `GenerateError`.
pub fn run(
    params: &GenerationParams,
    backend: &dyn GenerationBackend,
) -> Result<LessonPlan, GenerateError> {
    let prompt = build_prompt(params);
    let raw = backend.generate_content(&prompt, params.image.as_ref(), &response_schema())?;
    let generated = parse_generated(&raw)?;
    Ok(merge_with_precedence(params, generated))
}
