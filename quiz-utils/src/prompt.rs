//! Prompt templates sent to the generation provider.
//!
//! Templates are deterministic: the same input always produces the same prompt.
use crate::{attempt::MissedQuestion, error::Error};

/// Returned instead of a generated separata when every answer is correct.
pub const PERFECT_SCORE_FEEDBACK: &str = "## Excellent work!\n\n\
You answered every question correctly. Keep the momentum going: \
try another subject or a longer quiz to keep learning.";

/// Minimal prompt used as a liveness probe.
pub const CONNECTION_TEST_PROMPT: &str = "Reply with the single word: pong";

/// Builds the explanation prompt for one question.
///
/// Options are listed with letters when present. `correct_answer`, when given,
/// must index into `options`.
pub fn explanation_prompt(
    question_text: &str,
    options: &[String],
    correct_answer: Option<u32>,
    language: &str,
) -> Result<String, Error> {
    let question_text = question_text.trim();
    if question_text.is_empty() {
        return Err(Error::EmptyQuestionText);
    }

    let mut prompt = format!(
        "You are a teacher. Explain clearly and concisely (at most 100 words) the answer \
to the following general knowledge question. Use Markdown. Write your answer in {language}.\n\n\
Question: {question_text}\n"
    );

    if !options.is_empty() {
        prompt.push_str("\nOptions:\n");
        for (i, option) in options.iter().enumerate() {
            prompt.push_str(&format!("{}) {}\n", option_letter(i), option.trim()));
        }
    }

    if let Some(correct) = correct_answer {
        let Some(option) = options.get(correct as usize) else {
            return Err(Error::InvalidQuestion(format!(
                "correct_answer {correct} is out of range for {} options",
                options.len()
            )));
        };
        prompt.push_str(&format!(
            "\nCorrect answer: {}) {}\n",
            option_letter(correct as usize),
            option.trim()
        ));
    }

    Ok(prompt)
}

/// Builds the separata prompt for the questions a user got wrong.
///
/// Each entry lists the question, its options, the correct option and the one
/// the user chose. The model is asked to teach the underlying concepts without
/// spelling out the answers, since the user will retake the quiz.
pub fn feedback_prompt(missed: &[MissedQuestion<'_>], language: &str) -> String {
    let mut prompt = format!(
        "You are an expert educator writing an informative **separata** (a short study \
bulletin) in Markdown to help a student review general knowledge concepts. \
Write it in {language}.\n\n\
The student will read it before retaking the quiz. Do NOT state the correct answers \
explicitly or prominently, but make sure the text contains the information needed to \
reach them.\n\n\
**Questions the student answered incorrectly:**\n"
    );

    for (i, entry) in missed.iter().enumerate() {
        let question = entry.question;
        prompt.push_str(&format!("\n{}. {}\n", i + 1, question.question.trim()));
        if let Some(subject) = &question.subject {
            prompt.push_str(&format!("   Subject: {subject}\n"));
        }
        for (j, option) in question.options.iter().enumerate() {
            prompt.push_str(&format!("   {}) {}\n", option_letter(j), option.trim()));
        }
        prompt.push_str(&format!(
            "   Correct answer: {}\n",
            describe_option(question.correct_answer, entry.correct_option())
        ));
        prompt.push_str(&format!(
            "   Student's answer: {}\n",
            describe_option(entry.chosen_answer, entry.chosen_option())
        ));
    }

    prompt.push_str(
        "\n**Instructions for the separata:**\n\
1. Write it as an educational newsletter.\n\
2. Cover the TOPICS and CONCEPTS behind the questions above.\n\
3. Keep the correct answers implicit, woven into the explanations.\n\
4. Add relevant historical, geographical or cultural context.\n\
5. Include curious facts or complementary information.\n\
6. Use Markdown headings, subheadings and lists.\n\
7. At most 500 words.\n\
\nWrite the separata now:",
    );

    prompt
}

fn describe_option(index: u32, text: Option<&str>) -> String {
    match text {
        Some(text) => format!("{}) {}", option_letter(index as usize), text.trim()),
        None => format!("no valid option (index {index})"),
    }
}

/// `0 -> A`, `1 -> B`, ... falling back to 1-based numbers past `Z`.
pub fn option_letter(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}
