//! Built-in language profiles.

use super::{
    Abbreviation, AbbreviationKind, LanguageProfile, NumberFormat, WritingDirection,
};
use regex::Regex;

/// Closing punctuation allowed after a Latin sentence terminator.
const LATIN_CLOSERS: &str = r#"["'”’»)\]]*"#;

const DOT_DECIMAL: NumberFormat = NumberFormat {
    decimal_separator: '.',
    thousands_separator: ',',
};

const COMMA_DECIMAL: NumberFormat = NumberFormat {
    decimal_separator: ',',
    thousands_separator: '.',
};

const COMMA_DECIMAL_SPACED: NumberFormat = NumberFormat {
    decimal_separator: ',',
    thousands_separator: ' ',
};

pub(super) fn builtin_profiles() -> Vec<LanguageProfile> {
    vec![
        english(),
        korean(),
        chinese(),
        japanese(),
        french(),
        german(),
        spanish(),
        portuguese(),
        italian(),
        russian(),
        arabic(),
        hindi(),
    ]
}

// Patterns below are literals covered by the registry tests.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in language pattern must compile")
}

fn abbreviations(kind: AbbreviationKind, items: &[&'static str]) -> Vec<Abbreviation> {
    items
        .iter()
        .map(|text| Abbreviation { text, kind })
        .collect()
}

fn abbreviation_table(
    prepositive: &[&'static str],
    postpositive: &[&'static str],
    general: &[&'static str],
) -> Vec<Abbreviation> {
    let mut table = abbreviations(AbbreviationKind::Prepositive, prepositive);
    table.extend(abbreviations(AbbreviationKind::Postpositive, postpositive));
    table.extend(abbreviations(AbbreviationKind::General, general));
    table
}

/// Sentence terminator pattern for space-separated Latin-style scripts.
fn latin_sentence_end(terminators: &str) -> Regex {
    compile(&format!(r"[{terminators}]+{LATIN_CLOSERS}(?:\s+|$)"))
}

/// Markdown headings plus localized "Chapter N" style markers.
fn section_markers(words: &str) -> Regex {
    compile(&format!(
        r"(?mi)^[ \t]*(?:#{{1,6}}[ \t]+\S|(?:{words})[ \t]+(?:[0-9]+|[IVXLC]+)\b)"
    ))
}

pub(super) fn english() -> LanguageProfile {
    LanguageProfile {
        language_code: "en",
        name: "English",
        script_code: "Latn",
        writing_direction: WritingDirection::LeftToRight,
        sentence_end_pattern: latin_sentence_end(r".!?…"),
        section_marker_pattern: section_markers("Chapter|Section|Part|Appendix"),
        abbreviations: abbreviation_table(
            &[
                "Dr", "Mr", "Mrs", "Ms", "Prof", "St", "Mt", "Gen", "Capt", "Rev", "Hon", "Sen",
                "Rep", "Gov", "Lt", "Col", "Sgt", "Fig",
            ],
            &["Inc", "Ltd", "Corp", "Co", "Jr", "Sr", "LLC", "PLC", "etc", "a.m", "p.m"],
            &["e.g", "i.e", "vs", "approx", "cf", "al", "viz", "ca"],
        ),
        non_breaking_prefixes: vec!["No", "Vol", "pp", "p", "Eq", "Sec", "Ch", "Art", "Nos"],
        quotation_marks: vec![('"', '"'), ('“', '”'), ('‘', '’'), ('\'', '\'')],
        number_format: DOT_DECIMAL,
        numeric_ordinals: false,
    }
}

fn korean() -> LanguageProfile {
    LanguageProfile {
        language_code: "ko",
        name: "Korean",
        script_code: "Kore",
        writing_direction: WritingDirection::LeftToRight,
        // Formal and polite endings close a sentence even without punctuation.
        sentence_end_pattern: compile(
            r#"(?:[.!?…。]+|(?:습니다|입니다|됩니다|합니다|니다|어요|아요|에요|예요|해요|까요|세요|네요|군요)[.!?]*)["'”’)\]」』]*(?:\s+|$)"#,
        ),
        section_marker_pattern: compile(
            r"(?m)^[ \t]*(?:#{1,6}[ \t]+\S|제[ \t]*[0-9]+[ \t]*[장절조편부항]|[0-9]+[ \t]*장[ \t])",
        ),
        abbreviations: abbreviation_table(
            &["Dr", "Mr", "Prof"],
            &["Inc", "Ltd", "Co", "etc"],
            &["e.g", "i.e", "vs"],
        ),
        non_breaking_prefixes: vec!["No"],
        quotation_marks: vec![('“', '”'), ('‘', '’'), ('「', '」'), ('『', '』'), ('"', '"')],
        number_format: DOT_DECIMAL,
        numeric_ordinals: false,
    }
}

fn chinese() -> LanguageProfile {
    LanguageProfile {
        language_code: "zh",
        name: "Chinese",
        script_code: "Hani",
        writing_direction: WritingDirection::LeftToRight,
        sentence_end_pattern: compile(r#"[。！？!?…]+[”’」』）)]*\s*|[.](?:\s+|$)"#),
        section_marker_pattern: compile(
            r"(?m)^[ \t]*(?:#{1,6}[ \t]+\S|第[0-9一二三四五六七八九十百千]+[章节節篇部])",
        ),
        abbreviations: abbreviation_table(&["Dr", "Mr"], &["Inc", "Ltd", "etc"], &["e.g", "i.e", "vs"]),
        non_breaking_prefixes: Vec::new(),
        quotation_marks: vec![('“', '”'), ('‘', '’'), ('「', '」'), ('『', '』')],
        number_format: DOT_DECIMAL,
        numeric_ordinals: false,
    }
}

fn japanese() -> LanguageProfile {
    LanguageProfile {
        language_code: "ja",
        name: "Japanese",
        script_code: "Jpan",
        writing_direction: WritingDirection::LeftToRight,
        sentence_end_pattern: compile(r#"[。！？!?…]+[」』”’）)]*\s*|[.](?:\s+|$)"#),
        section_marker_pattern: compile(
            r"(?m)^[ \t]*(?:#{1,6}[ \t]+\S|第[0-9０-９一二三四五六七八九十百]+[章節部編])",
        ),
        abbreviations: abbreviation_table(&["Dr", "Mr"], &["Inc", "Ltd", "etc"], &["e.g", "i.e", "vs"]),
        non_breaking_prefixes: Vec::new(),
        quotation_marks: vec![('「', '」'), ('『', '』'), ('“', '”')],
        number_format: DOT_DECIMAL,
        numeric_ordinals: false,
    }
}

fn french() -> LanguageProfile {
    LanguageProfile {
        language_code: "fr",
        name: "French",
        script_code: "Latn",
        writing_direction: WritingDirection::LeftToRight,
        // French typography puts a (narrow) space before ! ? and inside guillemets.
        sentence_end_pattern: compile(r#"[ \u{00A0}\u{202F}]?[.!?…]+[ \u{00A0}\u{202F}]?["'”’»)\]]*(?:\s+|$)"#),
        section_marker_pattern: section_markers("Chapitre|Section|Partie|Annexe"),
        abbreviations: abbreviation_table(
            &["M", "MM", "Mme", "Mmes", "Mlle", "Dr", "Pr", "Me", "St", "Ste"],
            &["Cie", "SA", "SARL", "etc"],
            &["cf", "p.ex", "env", "av", "apr", "vol", "chap"],
        ),
        non_breaking_prefixes: vec!["No", "n°", "p", "pp"],
        quotation_marks: vec![('«', '»'), ('“', '”'), ('"', '"')],
        number_format: COMMA_DECIMAL_SPACED,
        numeric_ordinals: false,
    }
}

fn german() -> LanguageProfile {
    LanguageProfile {
        language_code: "de",
        name: "German",
        script_code: "Latn",
        writing_direction: WritingDirection::LeftToRight,
        sentence_end_pattern: latin_sentence_end(r".!?…"),
        section_marker_pattern: section_markers("Kapitel|Abschnitt|Teil|Anhang"),
        abbreviations: abbreviation_table(
            &["Dr", "Prof", "Hr", "Fr", "St"],
            &["GmbH", "AG", "e.V", "usw", "etc"],
            &["z.B", "bzw", "ca", "d.h", "u.a", "vgl", "Nr", "Str", "evtl", "ggf", "inkl"],
        ),
        non_breaking_prefixes: vec!["Nr", "S", "Abs", "Bd"],
        quotation_marks: vec![('„', '“'), ('»', '«'), ('"', '"')],
        number_format: COMMA_DECIMAL,
        numeric_ordinals: true,
    }
}

fn spanish() -> LanguageProfile {
    LanguageProfile {
        language_code: "es",
        name: "Spanish",
        script_code: "Latn",
        writing_direction: WritingDirection::LeftToRight,
        sentence_end_pattern: latin_sentence_end(r".!?…"),
        section_marker_pattern: section_markers("Capítulo|Sección|Parte|Anexo"),
        abbreviations: abbreviation_table(
            &["Sr", "Sra", "Srta", "Dr", "Dra", "Lic", "Ing", "D", "Dña"],
            &["S.A", "S.L", "Cía", "etc"],
            &["p.ej", "aprox", "pág", "núm", "vol", "cap"],
        ),
        non_breaking_prefixes: vec!["No", "Nº", "p", "pp"],
        quotation_marks: vec![('«', '»'), ('“', '”'), ('"', '"')],
        number_format: COMMA_DECIMAL,
        numeric_ordinals: false,
    }
}

fn portuguese() -> LanguageProfile {
    LanguageProfile {
        language_code: "pt",
        name: "Portuguese",
        script_code: "Latn",
        writing_direction: WritingDirection::LeftToRight,
        sentence_end_pattern: latin_sentence_end(r".!?…"),
        section_marker_pattern: section_markers("Capítulo|Seção|Secção|Parte|Anexo"),
        abbreviations: abbreviation_table(
            &["Sr", "Sra", "Dr", "Dra", "Prof", "Profa", "Exmo"],
            &["Ltda", "S.A", "Cia", "etc"],
            &["p.ex", "pág", "nº", "vol", "cap"],
        ),
        non_breaking_prefixes: vec!["No", "p", "pp"],
        quotation_marks: vec![('“', '”'), ('«', '»'), ('"', '"')],
        number_format: COMMA_DECIMAL,
        numeric_ordinals: false,
    }
}

fn italian() -> LanguageProfile {
    LanguageProfile {
        language_code: "it",
        name: "Italian",
        script_code: "Latn",
        writing_direction: WritingDirection::LeftToRight,
        sentence_end_pattern: latin_sentence_end(r".!?…"),
        section_marker_pattern: section_markers("Capitolo|Sezione|Parte|Appendice"),
        abbreviations: abbreviation_table(
            &["Sig", "Sig.ra", "Dott", "Prof", "Ing", "Avv", "On"],
            &["S.p.A", "S.r.l", "ecc", "etc"],
            &["es", "pag", "ca", "cfr", "vol"],
        ),
        non_breaking_prefixes: vec!["n", "p", "pp"],
        quotation_marks: vec![('«', '»'), ('“', '”'), ('"', '"')],
        number_format: COMMA_DECIMAL,
        numeric_ordinals: false,
    }
}

fn russian() -> LanguageProfile {
    LanguageProfile {
        language_code: "ru",
        name: "Russian",
        script_code: "Cyrl",
        writing_direction: WritingDirection::LeftToRight,
        sentence_end_pattern: latin_sentence_end(r".!?…"),
        section_marker_pattern: section_markers("Глава|Раздел|Часть|Приложение"),
        abbreviations: abbreviation_table(
            &["ул", "им", "проф", "акад", "пр"],
            // Year markers: "2020 г.", "1990-е гг."
            &["г", "гг", "т.д", "т.п", "др"],
            &["т.е", "т.к", "см", "напр", "стр", "рис"],
        ),
        non_breaking_prefixes: vec!["№", "с", "п"],
        quotation_marks: vec![('«', '»'), ('„', '“'), ('"', '"')],
        number_format: COMMA_DECIMAL_SPACED,
        numeric_ordinals: false,
    }
}

fn arabic() -> LanguageProfile {
    LanguageProfile {
        language_code: "ar",
        name: "Arabic",
        script_code: "Arab",
        writing_direction: WritingDirection::RightToLeft,
        sentence_end_pattern: compile(r#"[.!?؟۔…]+["'”’»)]*(?:\s+|$)"#),
        section_marker_pattern: compile(
            r"(?m)^[ \t]*(?:#{1,6}[ \t]+\S|(?:الفصل|الباب|القسم|الجزء)[ \t]+\S)",
        ),
        // Hijri and Gregorian year markers follow the number.
        abbreviations: abbreviation_table(&["د", "أ", "م.م"], &["هـ", "م"], &["ص", "ج"]),
        non_breaking_prefixes: Vec::new(),
        quotation_marks: vec![('«', '»'), ('“', '”'), ('"', '"')],
        number_format: NumberFormat {
            decimal_separator: '٫',
            thousands_separator: '٬',
        },
        numeric_ordinals: false,
    }
}

fn hindi() -> LanguageProfile {
    LanguageProfile {
        language_code: "hi",
        name: "Hindi",
        script_code: "Deva",
        writing_direction: WritingDirection::LeftToRight,
        sentence_end_pattern: compile(r#"[।॥.!?]+["'”’)]*(?:\s+|$)"#),
        section_marker_pattern: compile(
            r"(?m)^[ \t]*(?:#{1,6}[ \t]+\S|(?:अध्याय|भाग|खंड)[ \t]+\S)",
        ),
        abbreviations: abbreviation_table(&["डॉ", "श्री", "श्रीमती", "Dr", "Mr"], &["Ltd", "Inc"], &["सं", "e.g"]),
        non_breaking_prefixes: Vec::new(),
        quotation_marks: vec![('“', '”'), ('‘', '’'), ('"', '"')],
        number_format: DOT_DECIMAL,
        numeric_ordinals: false,
    }
}
