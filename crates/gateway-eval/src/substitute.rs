/// Replaces every `{{payload}}` placeholder (tolerant of inner whitespace,
/// e.g. `{{ payload }}`) in operator-supplied SQL with the name of the
/// ephemeral view built for the current event. All occurrences are
/// replaced, not just the first.
pub fn substitute_payload_placeholder(sql: &str, view_name: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' && bytes.get(i + 1) == Some(&b'{') {
            if let Some(end) = sql[i..].find("}}") {
                let inner = sql[i + 2..i + end].trim();
                if inner == "payload" {
                    out.push_str(view_name);
                    i += end + 2;
                    continue;
                }
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_all_occurrences() {
        let sql = "SELECT * FROM {{payload}} WHERE {{ payload }}.payload IS NOT NULL";
        let out = substitute_payload_placeholder(sql, "gw_event_1");
        assert_eq!(
            out,
            "SELECT * FROM gw_event_1 WHERE gw_event_1.payload IS NOT NULL"
        );
    }

    #[test]
    fn leaves_unrelated_braces_alone() {
        let sql = "SELECT {{other}} FROM t";
        let out = substitute_payload_placeholder(sql, "gw_event_1");
        assert_eq!(out, sql);
    }
}
