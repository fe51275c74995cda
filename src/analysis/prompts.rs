//! Instruction text for the analysis request and the follow-up chat.

use super::model::{AnalysisResult, AnalysisVariant};
use crate::profile::Profile;

/// Fortune year the analysis is framed around.
pub const DEFAULT_TARGET_YEAR: &str = "2025乙巳蛇年";

const FACE_DIRECTIVE: &str = "已附带面相照片，请针对五官、气色和痣相进行详细分析。";
const EAR_DIRECTIVE: &str = "已附带耳相照片，请结合耳廓、耳垂与耳位进行耳相分析。";
const NO_IMAGE_DIRECTIVE: &str =
    "未提供面相或耳相照片。面相解析部分请依据出生信息与命盘格局进行推演，不要假装看到了照片。";

/// Build the instruction block for an analysis request.
///
/// The image directives depend only on which images are present; the caller
/// attaches the images themselves.
pub fn analysis_instruction(
    profile: &Profile,
    variant: AnalysisVariant,
    target_year: &str,
    has_face: bool,
    has_ear: bool,
) -> String {
    let mut sections: Vec<String> = Vec::new();
    if variant.is_extended() {
        sections.push(
            "**本命盘解析 (Natal Chart Analysis)**：从大师视角深度剖析性格、事业、爱情、婚姻与财富。"
                .to_string(),
        );
    }
    sections.push(format!(
        "**今年运势 (Yearly Fortune)**：请务必针对 **{target_year}** 进行紫微流年大运预测。"
    ));
    sections.push(
        "**命运里程碑 (Milestones)**：确定未来几个重要的时间节点（具体年份和事件），并给出建议。"
            .to_string(),
    );
    sections.push("**面相解析 (Physiognomy)**：分别给出面相、耳相与痣相的命理推演。".to_string());
    sections.push(
        "**灵魂底色 (Personality Color)**：提供一个对应的 HEX 颜色代码（如 #7B68EE），并起一个富有诗意的中文名及含义。"
            .to_string(),
    );
    sections.push(
        "**命理映射 (Similar Person)**：寻找一位历史上命格相似的人物进行映射。"
            .to_string(),
    );
    if variant.is_extended() {
        sections.push(
            "**五行能量 (Five Elements)**：日主五行属性、形象描述、身强身弱、补益建议与禁忌。"
                .to_string(),
        );
        sections.push(
            "**人际关系 (Interpersonal)**：社交风格、贵人与人脉、社交注意点。"
                .to_string(),
        );
    }

    let numbered: Vec<String> = sections
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {s}", i + 1))
        .collect();

    let mut text = format!(
        "你是一位精通紫微斗数、子平八字和传统面相学的当代命理大师，你的代号是“蒜蒜”。\n\n\
         用户信息：\n\
         姓名：{name}\n\
         出生日期：{date}\n\
         出生时辰：{time}\n\
         星座：{zodiac}\n\n\
         请提供一份专业且深度的命理分析，语言使用简体中文。\n\n\
         {sections}\n\n\
         以严格的 JSON 格式返回，符合 Schema 要求，不要输出 JSON 以外的任何内容。",
        name = profile.name().trim(),
        date = profile.birth_date().trim(),
        time = profile.birth_time_label(),
        zodiac = if profile.zodiac().is_empty() { "未知" } else { profile.zodiac() },
        sections = numbered.join("\n"),
    );

    if has_face {
        text.push('\n');
        text.push_str(FACE_DIRECTIVE);
    }
    if has_ear {
        text.push('\n');
        text.push_str(EAR_DIRECTIVE);
    }
    if !has_face && !has_ear {
        text.push('\n');
        text.push_str(NO_IMAGE_DIRECTIVE);
    }
    text
}

/// System instruction for the follow-up chat session.
pub fn chat_system_instruction(profile: &Profile, analysis: &AnalysisResult) -> String {
    let mut lines = vec![
        "你是一位神秘的 AI 命理官，名叫“蒜蒜”。".to_string(),
        format!(
            "用户：{}，星座：{}。",
            profile.name().trim(),
            if profile.zodiac().is_empty() { "未知" } else { profile.zodiac() }
        ),
        format!("年度核心运势：{}", analysis.yearly_fortune),
        format!(
            "本命底色：{}（{}）——{}",
            analysis.personality_color.name,
            analysis.personality_color.hex,
            analysis.personality_color.meaning
        ),
    ];
    if let Some(chart) = &analysis.natal_chart {
        lines.push(format!("本命性格：{}", chart.personality));
    }
    if let Some(elements) = &analysis.five_elements {
        lines.push(format!("五行：{}（{}）", elements.element, elements.strength));
    }
    lines.push(String::new());
    lines.push("请使用简体中文回答后续问题。".to_string());
    lines.push(
        "语气：庄重、富有禅意且充满智慧，偶尔带有一点赛博朋克的冷峻感。回答要简练而深刻。"
            .to_string(),
    );
    lines.join("\n")
}
