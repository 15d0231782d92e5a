//! Textual and JSON emission.
//!
//! The canonical text form is what [`scan`](crate::scan) reads back;
//! `squished` drops optional padding while keeping separators, so
//! squished output still round-trips. The JSON form is one-way.

use crate::string_buffer::StringBuffer;
use crate::value::Value;

pub(crate) fn print_value(value: &Value, out: &mut StringBuffer, squished: bool) {
    match value {
        Value::Logical(v) => {
            out.add_bool(*v);
        }
        Value::Integer(v) => {
            out.add_long(*v);
        }
        Value::Double(v) => {
            out.add_double(*v);
        }
        Value::String(v) => {
            out.add_quoted(v);
        }
        Value::Blob(v) => {
            out.add_bytes(v);
        }
        Value::Address(v) => {
            out.append_char(b'@');
            out.add_string(&v.to_string());
        }
        Value::DateTime(v) => {
            out.append_char(b'$');
            out.append_char(if v.is_date() { b'D' } else { b'T' });
            out.add_string(&v.to_string());
        }
        Value::Array(arr) => {
            out.append_char(b'(');
            let mut first = true;
            for element in arr.iter() {
                if !squished || !first {
                    out.append_char(b' ');
                }
                print_value(element, out, squished);
                first = false;
            }
            if !squished {
                out.append_char(b' ');
            }
            out.append_char(b')');
        }
        Value::Map(map) => {
            out.append_char(b'{');
            let mut first = true;
            for (key, mapped) in map.iter() {
                if !first {
                    out.append_char(b',');
                }
                if !squished || !first {
                    out.append_char(b' ');
                }
                print_value(key, out, squished);
                if !squished {
                    out.append_char(b' ');
                }
                out.append_char(b'>');
                if !squished {
                    out.append_char(b' ');
                }
                print_value(mapped, out, squished);
                first = false;
            }
            if !squished {
                out.append_char(b' ');
            }
            out.append_char(b'}');
        }
        Value::Set(set) => {
            out.append_char(b'[');
            let mut first = true;
            for element in set.iter() {
                if !squished || !first {
                    out.append_char(b' ');
                }
                print_value(element, out, squished);
                first = false;
            }
            if !squished {
                out.append_char(b' ');
            }
            out.append_char(b']');
        }
        Value::Flaw(flaw) => {
            // Flaws have no readable form; the description is emitted for
            // diagnostics only.
            out.add_string(&flaw.to_string());
        }
    }
}

pub(crate) fn print_value_json(value: &Value, out: &mut StringBuffer, as_key: bool, squished: bool) {
    match value {
        Value::Logical(v) => {
            if as_key {
                out.append_char(b'"');
                out.add_bool(*v);
                out.append_char(b'"');
            } else {
                out.add_bool(*v);
            }
        }
        Value::Integer(v) => {
            if as_key {
                out.append_char(b'"');
                out.add_long(*v);
                out.append_char(b'"');
            } else {
                out.add_long(*v);
            }
        }
        Value::Double(v) => {
            if as_key {
                out.append_char(b'"');
                out.add_double(*v);
                out.append_char(b'"');
            } else {
                out.add_double(*v);
            }
        }
        Value::String(v) => {
            json_quoted(v, out);
        }
        Value::Blob(v) => {
            // No JSON analogue; the self-delimiting hex form travels as a
            // string.
            out.append_char(b'"');
            out.add_bytes(v);
            out.append_char(b'"');
        }
        Value::Address(v) => {
            out.append_char(b'"');
            out.add_string(&v.to_string());
            out.append_char(b'"');
        }
        Value::DateTime(v) => {
            out.append_char(b'"');
            out.add_string(&v.to_string());
            out.append_char(b'"');
        }
        Value::Array(arr) => {
            json_sequence(arr.iter(), out, squished);
        }
        Value::Set(set) => {
            json_sequence(set.iter(), out, squished);
        }
        Value::Map(map) => {
            out.append_char(b'{');
            let mut first = true;
            for (key, mapped) in map.iter() {
                if !first {
                    out.append_char(b',');
                }
                if !squished || !first {
                    out.append_char(b' ');
                }
                print_value_json(key, out, true, squished);
                if !squished {
                    out.append_char(b' ');
                }
                out.append_char(b':');
                if !squished {
                    out.append_char(b' ');
                }
                print_value_json(mapped, out, false, squished);
                first = false;
            }
            if !squished {
                out.append_char(b' ');
            }
            out.append_char(b'}');
        }
        Value::Flaw(flaw) => {
            json_quoted(flaw.to_string().as_bytes(), out);
        }
    }
}

fn json_sequence<'a>(
    elements: impl Iterator<Item = &'a Value>,
    out: &mut StringBuffer,
    squished: bool,
) {
    out.append_char(b'[');
    let mut first = true;
    for element in elements {
        if !first {
            out.append_char(b',');
        }
        if !squished || !first {
            out.append_char(b' ');
        }
        print_value_json(element, out, false, squished);
        first = false;
    }
    if !squished {
        out.append_char(b' ');
    }
    out.append_char(b']');
}

/// JSON string escaping over raw bytes. Bytes with the high bit set pass
/// through untouched on the assumption the payload is UTF-8.
fn json_quoted(payload: &[u8], out: &mut StringBuffer) {
    out.append_char(b'"');
    for &byte in payload {
        match byte {
            b'"' => {
                out.add_string("\\\"");
            }
            b'\\' => {
                out.add_string("\\\\");
            }
            0x08 => {
                out.add_string("\\b");
            }
            0x0C => {
                out.add_string("\\f");
            }
            b'\n' => {
                out.add_string("\\n");
            }
            b'\r' => {
                out.add_string("\\r");
            }
            b'\t' => {
                out.add_string("\\t");
            }
            b if b < 0x20 => {
                out.add_string(&format!("\\u{:04x}", b));
            }
            b => {
                out.append_char(b);
            }
        }
    }
    out.append_char(b'"');
}
