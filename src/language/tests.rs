use super::*;

#[test]
fn french_question_is_french() {
    let language = Language::detect(
        "Bonjour, comment est-ce que je peux poser des congés payés pour la semaine prochaine ?",
    );
    assert_eq!(language, Language::French);
}

#[test]
fn english_question_is_english() {
    let language = Language::detect(
        "Hello, how can I check my remaining leave balance for the rest of this year?",
    );
    assert_eq!(language, Language::English);
}

#[test]
fn other_detected_language_routes_to_english() {
    let language = Language::detect(
        "Guten Tag, wie kann ich meinen Jahresurlaub für den nächsten Monat beantragen?",
    );
    assert_eq!(language, Language::English);
}

#[test]
fn undetectable_text_defaults_to_french() {
    assert_eq!(Language::detect(""), Language::French);
    assert_eq!(Language::detect("?!"), Language::French);
}

#[test]
fn detector_mapping() {
    assert_eq!(Language::from_detected(Some(Lang::Fra)), Language::French);
    assert_eq!(Language::from_detected(Some(Lang::Eng)), Language::English);
    assert_eq!(Language::from_detected(Some(Lang::Spa)), Language::English);
    assert_eq!(Language::from_detected(None), Language::French);
}

#[test]
fn codes() {
    assert_eq!(Language::French.code(), "fr");
    assert_eq!(Language::English.to_string(), "en");
}

#[test]
fn short_sample_questions_route_correctly() {
    for question in [
        "Comment récupérer ma fiche de paie ?",
        "Quand est-ce que je suis payé ?",
        "Comment poser des congés ?",
        "Quel est le remboursement pour les lunettes ?",
    ] {
        assert_eq!(Language::detect(question), Language::French, "{question}");
    }
    assert_eq!(
        Language::detect("How can I check my leave balance?"),
        Language::English
    );
}

#[test]
fn detection_stays_within_candidates() {
    for question in [
        "Quand est-ce que je suis payé ?",
        "How can I check my leave balance?",
        "Ma mutuelle ?",
    ] {
        let detected = DETECTOR.detect_lang(question).expect("latin text detects");
        assert!(CANDIDATE_LANGUAGES.contains(&detected), "{question}: {detected:?}");
    }
}
