use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static NOW_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bNOW\(\)").expect("valid NOW() pattern"));

static ILIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\w+(?:\.\w+)?)\s+(NOT\s+)?ILIKE\s+(\$\d+|\?|'[^']*')")
        .expect("valid ILIKE pattern")
});

static TO_CHAR_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)TO_CHAR\(([^,]+),\s*'YYYY-MM-DD'\)").expect("valid TO_CHAR date pattern")
});

static TO_CHAR_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)TO_CHAR\(([^,]+),\s*'HH24:MI'\)").expect("valid TO_CHAR time pattern")
});

/// Apply the text rewrites in order: `NOW()`, `ILIKE`, then `TO_CHAR`.
///
/// Placeholders are left alone; the caller rewrites them afterwards.
pub(super) fn rewrite_functions(sql: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(sql);

    replace(&mut out, &NOW_CALL, |_| "datetime('now')".to_string());
    replace(&mut out, &ILIKE, |caps| {
        let not = if caps.get(2).is_some() { "NOT " } else { "" };
        format!("UPPER({}) {not}LIKE UPPER({})", &caps[1], &caps[3])
    });
    replace(&mut out, &TO_CHAR_DATE, |caps| {
        format!("strftime('%Y-%m-%d', {})", caps[1].trim())
    });
    replace(&mut out, &TO_CHAR_TIME, |caps| {
        format!("strftime('%H:%M', {})", caps[1].trim())
    });

    out
}

fn replace<F>(text: &mut Cow<'_, str>, pattern: &Regex, rewrite: F)
where
    F: Fn(&Captures) -> String,
{
    let next = match pattern.replace_all(text.as_ref(), |caps: &Captures| rewrite(caps)) {
        Cow::Owned(s) => Some(s),
        Cow::Borrowed(_) => None,
    };
    if let Some(s) = next {
        *text = Cow::Owned(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_becomes_datetime() {
        let out = rewrite_functions("UPDATE t SET atualizado_em = now() WHERE criado < NOW()");
        assert_eq!(
            out,
            "UPDATE t SET atualizado_em = datetime('now') WHERE criado < datetime('now')"
        );
    }

    #[test]
    fn ilike_wraps_both_sides() {
        assert_eq!(
            rewrite_functions("SELECT * FROM alunos a WHERE a.nome_completo ilike $1"),
            "SELECT * FROM alunos a WHERE UPPER(a.nome_completo) LIKE UPPER($1)"
        );
        assert_eq!(
            rewrite_functions("WHERE nome ILIKE ?"),
            "WHERE UPPER(nome) LIKE UPPER(?)"
        );
        assert_eq!(
            rewrite_functions("WHERE nome ILIKE '%silva%'"),
            "WHERE UPPER(nome) LIKE UPPER('%silva%')"
        );
        assert_eq!(
            rewrite_functions("WHERE nome NOT ILIKE $2"),
            "WHERE UPPER(nome) NOT LIKE UPPER($2)"
        );
    }

    #[test]
    fn to_char_becomes_strftime() {
        assert_eq!(
            rewrite_functions("SELECT TO_CHAR(s.criado_em, 'YYYY-MM-DD') AS dia FROM s"),
            "SELECT strftime('%Y-%m-%d', s.criado_em) AS dia FROM s"
        );
        assert_eq!(
            rewrite_functions("SELECT to_char(criado_em,'HH24:MI') FROM s"),
            "SELECT strftime('%H:%M', criado_em) FROM s"
        );
    }

    #[test]
    fn untouched_sql_is_borrowed() {
        let sql = "SELECT id FROM t WHERE x LIKE ?";
        assert!(matches!(rewrite_functions(sql), Cow::Borrowed(_)));
    }
}
