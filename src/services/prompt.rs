use crate::models::{ProblemWord, ReadingLevel, VocabularyMode};

/// Everything the prompt builder needs to know about one generation request.
pub struct PromptInputs<'a> {
    pub topic: &'a str,
    pub sub_interests: &'a [String],
    pub reading_level: ReadingLevel,
    pub mode: VocabularyMode,
    pub problem_words: &'a [ProblemWord],
    /// Non-frequent words the user has already been exposed to; excluded
    /// alongside the problem words in hide mode.
    pub already_used: &'a [String],
}

fn reading_level_clause(level: ReadingLevel) -> &'static str {
    match level {
        ReadingLevel::Casual => {
            "Please ensure the output is readable at a 5th grade level and is accessible to a general audience."
        }
        ReadingLevel::Standard => {
            "Please ensure the output is readable at a 9th grade level. Make this appeal to young adults."
        }
        ReadingLevel::Academic => "Please ensure the output is written in an academic style.",
    }
}

fn quoted_list(words: &[String]) -> String {
    words
        .iter()
        .map(|w| format!("\"{}\"", w))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the system instruction: writer persona, reading-level modifier, and
/// at most one vocabulary clause depending on the mode.
pub fn build_system_prompt(inputs: &PromptInputs) -> String {
    let mut prompt = format!(
        "You are a highly skilled writer tasked with creating captivating pieces of text on a given topic.\n\
         You will be given a topic and you will respond ONLY with around 4 paragraphs of text about the topic.\n\
         \n\
         {}\n\
         \n\
         The user will not be able to respond to your text, so do not attempt to make conversation at all. \
         Respond immediately with the text after receiving the topic.\n",
        reading_level_clause(inputs.reading_level)
    );

    match inputs.mode {
        VocabularyMode::Hide => {
            let mut excluded: Vec<String> = inputs
                .problem_words
                .iter()
                .map(|pw| pw.word.clone())
                .collect();
            excluded.extend(inputs.already_used.iter().cloned());
            if !excluded.is_empty() {
                prompt.push_str(&format!(
                    "\nThe user struggles with pronouncing certain words, so you must completely avoid \
                     using the following words or any variations of them (including plurals, different \
                     tenses, or capitalizations): {}.\n\
                     \n\
                     This is very important for the user's learning experience. Double-check your \
                     response to ensure none of these words appear.",
                    quoted_list(&excluded)
                ));
            }
        }
        VocabularyMode::Emphasize => {
            let emphasized: Vec<String> = inputs
                .problem_words
                .iter()
                .map(|pw| pw.word.clone())
                .collect();
            if !emphasized.is_empty() {
                prompt.push_str(&format!(
                    "\nThe user is practicing pronouncing certain words, so please try to naturally \
                     include the following words in your text: {}.",
                    quoted_list(&emphasized)
                ));
            }
        }
        VocabularyMode::Unconstrained => {}
    }

    prompt
}

/// Build the user instruction from the topic and optional sub-interests.
pub fn build_user_prompt(topic: &str, sub_interests: &[String]) -> String {
    if sub_interests.is_empty() {
        format!("Write about the topic: {}", topic)
    } else {
        format!(
            "Write about the topic: {}, with themes related to {}",
            topic,
            sub_interests.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(words: &[&str]) -> Vec<ProblemWord> {
        words
            .iter()
            .map(|w| ProblemWord {
                word: w.to_string(),
                frequency: 0.0,
            })
            .collect()
    }

    fn inputs<'a>(
        mode: VocabularyMode,
        problem_words: &'a [ProblemWord],
        already_used: &'a [String],
    ) -> PromptInputs<'a> {
        PromptInputs {
            topic: "space travel",
            sub_interests: &[],
            reading_level: ReadingLevel::Casual,
            mode,
            problem_words,
            already_used,
        }
    }

    #[test]
    fn test_hide_clause_lists_problem_and_used_words() {
        let words = problem(&["rocket"]);
        let used = vec!["xylograph".to_string()];
        let prompt = build_system_prompt(&inputs(VocabularyMode::Hide, &words, &used));
        assert!(prompt.contains("completely avoid"));
        assert!(prompt.contains("\"rocket\", \"xylograph\""));
        assert!(!prompt.contains("try to naturally include"));
    }

    #[test]
    fn test_emphasize_clause_lists_only_problem_words() {
        let words = problem(&["rocket"]);
        let used = vec!["xylograph".to_string()];
        let prompt = build_system_prompt(&inputs(VocabularyMode::Emphasize, &words, &used));
        assert!(prompt.contains("try to naturally include"));
        assert!(prompt.contains("\"rocket\""));
        assert!(!prompt.contains("xylograph"));
        assert!(!prompt.contains("completely avoid"));
    }

    #[test]
    fn test_unconstrained_has_no_vocabulary_clause() {
        let prompt = build_system_prompt(&inputs(VocabularyMode::Unconstrained, &[], &[]));
        assert!(!prompt.contains("completely avoid"));
        assert!(!prompt.contains("try to naturally include"));
    }

    #[test]
    fn test_hide_with_no_words_adds_no_clause() {
        let prompt = build_system_prompt(&inputs(VocabularyMode::Hide, &[], &[]));
        assert!(!prompt.contains("completely avoid"));
    }

    #[test]
    fn test_reading_level_clauses_differ() {
        let words = problem(&[]);
        let mut casual = inputs(VocabularyMode::Unconstrained, &words, &[]);
        casual.reading_level = ReadingLevel::Casual;
        let mut academic = inputs(VocabularyMode::Unconstrained, &words, &[]);
        academic.reading_level = ReadingLevel::Academic;
        assert!(build_system_prompt(&casual).contains("5th grade"));
        assert!(build_system_prompt(&academic).contains("academic style"));
    }

    #[test]
    fn test_user_prompt_with_sub_interests() {
        assert_eq!(
            build_user_prompt("space travel", &[]),
            "Write about the topic: space travel"
        );
        assert_eq!(
            build_user_prompt(
                "space travel",
                &["mars".to_string(), "rovers".to_string()]
            ),
            "Write about the topic: space travel, with themes related to mars, rovers"
        );
    }
}
