use std::fmt::Write as _;

use client_core::SessionSnapshot;

pub fn render(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Service Manager ==");
    if !snapshot.message.is_empty() {
        let _ = writeln!(out, "> {}", snapshot.message);
    }

    let Some(folder) = &snapshot.folder else {
        let _ = writeln!(out, "Create a new folder");
        let _ = writeln!(out, "  name: {}", draft_or_placeholder(&snapshot.folder_name_draft));
        let action = if snapshot.busy { "creating..." } else { "create" };
        let _ = writeln!(out, "  [{action}]  or  fetch <id>");
        return out;
    };

    let _ = writeln!(out, "Folder: {}  (ID: {})", folder.name, folder.id);
    let _ = writeln!(out, "Add a service");
    let _ = writeln!(
        out,
        "  title: {}",
        draft_or_placeholder(&snapshot.service_draft.title)
    );
    let _ = writeln!(
        out,
        "  description: {}",
        draft_or_placeholder(&snapshot.service_draft.description)
    );

    if !snapshot.services.is_empty() {
        let action = if snapshot.busy { "saving..." } else { "save" };
        let _ = writeln!(out, "Services ({})  [{action}]", snapshot.services.len());
        for (index, service) in snapshot.services.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}  [{}]", index + 1, service.title, service.id);
            let _ = writeln!(out, "     {}", service.description);
        }
    }
    let _ = writeln!(out, "[reset] to create a new folder");
    out
}

fn draft_or_placeholder(value: &str) -> &str {
    if value.is_empty() {
        "(empty)"
    } else {
        value
    }
}
