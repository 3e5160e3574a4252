use serde::{Deserialize, Serialize};

/// Teacher designation as it appears on the printed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Designation {
    #[serde(rename = "Assistant Teacher")]
    AssistantTeacher,
    #[serde(rename = "Head Teacher")]
    HeadTeacher,
}

impl Designation {
    pub fn as_str(self) -> &'static str {
        match self {
            Designation::AssistantTeacher => "Assistant Teacher",
            Designation::HeadTeacher => "Head Teacher",
        }
    }

    pub fn parse(raw: &str) -> Option<Designation> {
        match raw {
            "Assistant Teacher" => Some(Designation::AssistantTeacher),
            "Head Teacher" => Some(Designation::HeadTeacher),
            _ => None,
        }
    }
}

impl Default for Designation {
    fn default() -> Self {
        Designation::AssistantTeacher
    }
}

/// The ten named prose slots of the teaching-learning activity section,
/// in fixed document order. Values are restricted HTML fragments
/// (bold / italic / bulleted list only). Empty string means "unset";
/// no slot is ever absent at the type level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonActivities {
    pub introduction: String,
    pub review_prior_knowledge: String,
    pub review_previous_session: String,
    pub presentation: String,
    pub practice: String,
    pub assessment: String,
    pub homework: String,
    pub feedback: String,
    pub summary: String,
    pub concluding: String,
}

/// The canonical lesson-plan document shared by the form and the preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonPlan {
    pub school_name: String,
    pub school_address: String,
    pub teacher_name: String,
    pub teacher_designation: Designation,
    pub topic: String,
    pub grade_level: String,
    pub unit: String,
    pub lesson_no: String,
    pub session_no: String,
    pub page_no: String,
    pub duration: String,
    pub learning_outcomes: String,
    pub teaching_aids: String,
    pub activities: LessonActivities,
}

impl Default for LessonPlan {
    fn default() -> Self {
        LessonPlan {
            school_name: String::new(),
            school_address: String::new(),
            teacher_name: String::new(),
            teacher_designation: Designation::default(),
            topic: String::new(),
            grade_level: "Class 3".to_string(),
            unit: String::new(),
            lesson_no: String::new(),
            session_no: String::new(),
            page_no: String::new(),
            duration: "40 minutes".to_string(),
            learning_outcomes: String::new(),
            teaching_aids: String::new(),
            activities: LessonActivities::default(),
        }
    }
}

/// Attached textbook image, held only for the next generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Base64-encoded bytes, without any data-URL prefix.
    pub data: String,
    pub mime_type: String,
}

/// Everything the generation request is built from: the full plan the user
/// has typed so far plus the transient inputs that never enter the
/// canonical document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationParams {
    pub plan: LessonPlan,
    pub image: Option<ImagePayload>,
    pub textbook_text: String,
}

/// A partial update to the plan. Absent fields keep their current value;
/// absent activity slots keep their siblings (the merge is field-wise
/// within the nested group, never a group replace).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonPlanUpdate {
    pub school_name: Option<String>,
    pub school_address: Option<String>,
    pub teacher_name: Option<String>,
    pub teacher_designation: Option<Designation>,
    pub topic: Option<String>,
    pub grade_level: Option<String>,
    pub unit: Option<String>,
    pub lesson_no: Option<String>,
    pub session_no: Option<String>,
    pub page_no: Option<String>,
    pub duration: Option<String>,
    pub learning_outcomes: Option<String>,
    pub teaching_aids: Option<String>,
    pub activities: Option<ActivitiesUpdate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivitiesUpdate {
    pub introduction: Option<String>,
    pub review_prior_knowledge: Option<String>,
    pub review_previous_session: Option<String>,
    pub presentation: Option<String>,
    pub practice: Option<String>,
    pub assessment: Option<String>,
    pub homework: Option<String>,
    pub feedback: Option<String>,
    pub summary: Option<String>,
    pub concluding: Option<String>,
}

impl ActivitiesUpdate {
    /// The slots this update actually carries, as (wire name, value) pairs.
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let mut push = |slot, v: Option<String>| {
            if let Some(v) = v {
                out.push((slot, v));
            }
        };
        push("introduction", self.introduction);
        push("reviewPriorKnowledge", self.review_prior_knowledge);
        push("reviewPreviousSession", self.review_previous_session);
        push("presentation", self.presentation);
        push("practice", self.practice);
        push("assessment", self.assessment);
        push("homework", self.homework);
        push("feedback", self.feedback);
        push("summary", self.summary);
        push("concluding", self.concluding);
        out
    }
}

fn take(target: &mut String, v: Option<String>) {
    if let Some(v) = v {
        *target = v;
    }
}

impl LessonPlanUpdate {
    pub fn apply_to(self, plan: &mut LessonPlan) {
        take(&mut plan.school_name, self.school_name);
        take(&mut plan.school_address, self.school_address);
        take(&mut plan.teacher_name, self.teacher_name);
        if let Some(d) = self.teacher_designation {
            plan.teacher_designation = d;
        }
        take(&mut plan.topic, self.topic);
        take(&mut plan.grade_level, self.grade_level);
        take(&mut plan.unit, self.unit);
        take(&mut plan.lesson_no, self.lesson_no);
        take(&mut plan.session_no, self.session_no);
        take(&mut plan.page_no, self.page_no);
        take(&mut plan.duration, self.duration);
        take(&mut plan.learning_outcomes, self.learning_outcomes);
        take(&mut plan.teaching_aids, self.teaching_aids);
        if let Some(acts) = self.activities {
            let a = &mut plan.activities;
            take(&mut a.introduction, acts.introduction);
            take(&mut a.review_prior_knowledge, acts.review_prior_knowledge);
            take(&mut a.review_previous_session, acts.review_previous_session);
            take(&mut a.presentation, acts.presentation);
            take(&mut a.practice, acts.practice);
            take(&mut a.assessment, acts.assessment);
            take(&mut a.homework, acts.homework);
            take(&mut a.feedback, acts.feedback);
            take(&mut a.summary, acts.summary);
            take(&mut a.concluding, acts.concluding);
        }
    }
}

/// Activity slot names in document order, paired with whether the slot is
/// optional in the rendered document and mandatory in the generated output.
pub const ACTIVITY_SLOTS: [(&str, bool); 10] = [
    ("introduction", false),
    ("reviewPriorKnowledge", true),
    ("reviewPreviousSession", true),
    ("presentation", false),
    ("practice", false),
    ("assessment", false),
    ("homework", true),
    ("feedback", false),
    ("summary", false),
    ("concluding", false),
];

impl LessonActivities {
    pub fn get(&self, slot: &str) -> Option<&str> {
        match slot {
            "introduction" => Some(&self.introduction),
            "reviewPriorKnowledge" => Some(&self.review_prior_knowledge),
            "reviewPreviousSession" => Some(&self.review_previous_session),
            "presentation" => Some(&self.presentation),
            "practice" => Some(&self.practice),
            "assessment" => Some(&self.assessment),
            "homework" => Some(&self.homework),
            "feedback" => Some(&self.feedback),
            "summary" => Some(&self.summary),
            "concluding" => Some(&self.concluding),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, slot: &str) -> Option<&mut String> {
        match slot {
            "introduction" => Some(&mut self.introduction),
            "reviewPriorKnowledge" => Some(&mut self.review_prior_knowledge),
            "reviewPreviousSession" => Some(&mut self.review_previous_session),
            "presentation" => Some(&mut self.presentation),
            "practice" => Some(&mut self.practice),
            "assessment" => Some(&mut self.assessment),
            "homework" => Some(&mut self.homework),
            "feedback" => Some(&mut self.feedback),
            "summary" => Some(&mut self.summary),
            "concluding" => Some(&mut self.concluding),
            _ => None,
        }
    }
}
