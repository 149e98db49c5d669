use chrono::NaiveDate;
use lesson_planner::{
    DocumentKind, ExportFormat, ImportSection, LedgerField, LessonPlanner, PlannerSettings,
    SlotField, SlotId, Status, dates, export_filename, labels, planner::export_status, telemetry,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn render_text_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            if ci < widths.len() && len > widths[ci] {
                widths[ci] = len;
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let line = |cells: Vec<&str>| {
        let mut out = String::from("|");
        for (i, w) in widths.iter().enumerate() {
            let s = cells.get(i).copied().unwrap_or("");
            out.push(' ');
            out.push_str(s);
            out.push_str(&" ".repeat(w.saturating_sub(s.chars().count())));
            out.push_str(" |");
        }
        out
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&line(header.to_vec()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out.push_str(&sep);
    out
}

fn render_grid(planner: &LessonPlanner) -> String {
    let rows: Vec<Vec<String>> = planner
        .grid()
        .slots()
        .iter()
        .map(|slot| {
            let mut row = vec![
                slot.id.to_string(),
                labels::day_label(slot.day_index()),
                labels::session_label(slot.session_index(), slot.is_weekend()),
            ];
            row.extend(SlotField::ALL.iter().map(|f| slot.field(*f).to_string()));
            row
        })
        .collect();
    render_text_table(
        &[
            "id", "day", "session", "class", "subject", "subSubject", "ppct", "lessonName", "note",
        ],
        &rows,
    )
}

fn render_ledger(planner: &LessonPlanner) -> String {
    let rows: Vec<Vec<String>> = planner
        .ledger()
        .rows()
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                i.to_string(),
                format!("{} {}", r.day, r.date).trim().to_string(),
                r.session.clone(),
                r.subject.clone(),
                r.sub_subject.clone(),
                r.lesson_plan_period.clone(),
                r.lesson_name.clone(),
                r.student_attendance.clone(),
                r.teacher_comment.clone(),
                r.teacher_name.clone(),
            ]
        })
        .collect();
    render_text_table(
        &[
            "#", "day", "session", "subject", "subSubject", "period", "lesson", "attendance",
            "comment", "teacher",
        ],
        &rows,
    )
}

fn print_status(status: &Status) {
    println!("{}", status.message);
}

fn parse_date_arg(s: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match s {
        None | Some("-") => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| format!("Invalid date '{}': {}", v, e)),
    }
}

fn rest_of_line<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}

fn print_settings(settings: &PlannerSettings) {
    match serde_json::to_string_pretty(settings) {
        Ok(json) => println!("{json}"),
        Err(e) => println!("Failed to render settings: {}", e),
    }
}

fn write_file(dir: &Path, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    let path = dir.join(filename);
    fs::write(&path, bytes)?;
    Ok(path)
}

fn print_help() {
    println!(
        "Commands:\n  help                                    Show this help\n  grid                                    Show every slot with its id\n  show <plan|ledger>                      Show a document as it will be exported\n  set <day-session> <field> <text...>     Edit a slot (class, subject, subSubject, ppct, lessonName, note)\n  add-session <day>                       Append a session to a day (0 = Monday)\n  save                                    Save the lesson plan\n  sync                                    Synchronize the lesson plan into the ledger\n  mark <row> <attendance|comment> <text>  Edit a ledger row\n  settings show                           Show settings\n  settings <field> <text...>              Set business|address|owner|teacher|week|group\n  settings <from|to> <YYYY-MM-DD|->       Set or clear a week date\n  settings <load|save> <path>             Load or save settings as JSON\n  subjects                                List subjects of the active grade group\n  subject <add|delete> <name...>          Edit subjects of the active grade group\n  sub add <subject> / <name...>           Add a sub-subject\n  sub delete <subject> / <index>          Delete a sub-subject\n  import <curriculum|plan> [path]         Import an .xlsx or .csv file\n  template <curriculum|plan> <dir>        Write an empty import template\n  export <plan|ledger> <xlsx|docx> <dir>  Export a document\n  quit|exit                               Exit"
    );
}

fn main() {
    telemetry::init_tracing();
    let mut planner = LessonPlanner::new();

    println!("Lesson Planner (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "grid" => println!("{}", render_grid(&planner)),
            "show" => match parts.next() {
                Some(kind) => match kind.parse::<DocumentKind>() {
                    Ok(kind) => print!("{}", planner.skeleton(kind, dates::today())),
                    Err(e) => println!("{}", e),
                },
                None => println!("{}", render_grid(&planner)),
            },
            "set" => {
                let id = parts.next().map(str::parse::<SlotId>);
                let field = parts.next().map(str::parse::<SlotField>);
                match (id, field) {
                    (Some(Ok(id)), Some(Ok(field))) => {
                        let value = rest_of_line(parts);
                        if planner.update_slot(id, field, value) {
                            println!("Updated {} of slot {}.", field.as_str(), id);
                        } else {
                            println!("Slot {} does not exist.", id);
                        }
                    }
                    (Some(Err(e)), _) | (_, Some(Err(e))) => println!("{}", e),
                    _ => println!("Usage: set <day-session> <field> <text...>"),
                }
            }
            "add-session" => match parts.next().and_then(|s| s.parse::<u8>().ok()) {
                Some(day) => match planner.append_session(day) {
                    Some(id) => println!(
                        "Added {} to {} (slot {}).",
                        labels::session_label(id.session_index, labels::is_weekend(day)),
                        labels::day_label(day),
                        id
                    ),
                    None => println!("Day index must be between 0 and 6."),
                },
                None => println!("Usage: add-session <day>"),
            },
            "save" => print_status(&planner.save_lesson_plan()),
            "sync" => {
                let status = planner.synchronize();
                print_status(&status);
                if status.is_success() {
                    println!("{}", render_ledger(&planner));
                }
            }
            "mark" => {
                let index = parts.next().and_then(|s| s.parse::<usize>().ok());
                let field = parts.next().map(str::parse::<LedgerField>);
                match (index, field) {
                    (Some(index), Some(Ok(field))) => {
                        if planner.update_ledger(index, field, rest_of_line(parts)) {
                            println!("Updated ledger row {}.", index);
                        } else {
                            println!("Ledger row {} does not exist.", index);
                        }
                    }
                    (_, Some(Err(e))) => println!("{}", e),
                    _ => println!("Usage: mark <row> <attendance|comment> <text...>"),
                }
            }
            "settings" => {
                let sub = parts.next().unwrap_or("show");
                match sub {
                    "show" => print_settings(planner.settings()),
                    "load" => match parts.next() {
                        Some(path) => match PlannerSettings::load_from_json(path) {
                            Ok(settings) => {
                                planner.set_settings(settings);
                                println!("Settings loaded from {}", path);
                            }
                            Err(e) => println!("Failed to load settings: {}", e),
                        },
                        None => println!("Usage: settings load <path>"),
                    },
                    "save" => match parts.next() {
                        Some(path) => match planner.settings().save_to_json(path) {
                            Ok(()) => println!("Settings saved to {}", path),
                            Err(e) => println!("Failed to save settings: {}", e),
                        },
                        None => println!("Usage: settings save <path>"),
                    },
                    "from" | "to" => match parse_date_arg(parts.next()) {
                        Ok(date) => {
                            let settings = planner.settings_mut();
                            if sub == "from" {
                                settings.from_date = date;
                            } else {
                                settings.to_date = date;
                            }
                            println!("Set {} date to {}.", sub, dates::format_header_date(date));
                        }
                        Err(e) => println!("{}", e),
                    },
                    field => {
                        let value = rest_of_line(parts);
                        let settings = planner.settings_mut();
                        let target = match field {
                            "business" => &mut settings.business_name,
                            "address" => &mut settings.business_address,
                            "owner" => &mut settings.business_owner,
                            "teacher" => &mut settings.teacher_name,
                            "week" => &mut settings.week,
                            "group" => &mut settings.grade_group,
                            other => {
                                println!("Unknown setting '{}'. Type 'help' for usage.", other);
                                continue;
                            }
                        };
                        *target = value;
                        println!("Set {}.", field);
                    }
                }
            }
            "subjects" => {
                let group = planner.settings().grade_group.clone();
                println!("{}", group);
                for subject in planner.catalog().subjects(&group) {
                    let subs = planner.catalog().sub_subjects(&group, subject).join(", ");
                    println!("  {}: {}", subject, subs);
                }
            }
            "subject" => {
                let action = parts.next();
                let name = rest_of_line(parts);
                let group = planner.settings().grade_group.clone();
                let catalog = planner.catalog_mut();
                let changed = match action {
                    Some("add") => catalog.add_subject(&group, &name),
                    Some("delete") => catalog.delete_subject(&group, &name),
                    _ => {
                        println!("Usage: subject <add|delete> <name...>");
                        continue;
                    }
                };
                if changed {
                    println!("Updated subjects of {}.", group);
                } else {
                    println!("Subject '{}' was not changed.", name);
                }
            }
            "sub" => {
                let action = parts.next();
                let rest = rest_of_line(parts);
                let Some((subject, arg)) = rest.split_once(" / ") else {
                    println!("Usage: sub <add|delete> <subject> / <name|index>");
                    continue;
                };
                let group = planner.settings().grade_group.clone();
                let catalog = planner.catalog_mut();
                let changed = match action {
                    Some("add") => catalog.add_sub_subject(&group, subject, arg),
                    Some("delete") => arg
                        .trim()
                        .parse::<usize>()
                        .map(|idx| catalog.delete_sub_subject(&group, subject, idx))
                        .unwrap_or(false),
                    _ => {
                        println!("Usage: sub <add|delete> <subject> / <name|index>");
                        continue;
                    }
                };
                if changed {
                    println!("Updated sub-subjects of {}.", subject);
                } else {
                    println!("Sub-subjects of '{}' were not changed.", subject);
                }
            }
            "import" => match parts.next().map(str::parse::<ImportSection>) {
                Some(Ok(section)) => {
                    let path = parts.next().map(Path::new);
                    print_status(&planner.import(section, path));
                }
                Some(Err(e)) => println!("{}", e),
                None => println!("Usage: import <curriculum|plan> [path]"),
            },
            "template" => {
                let section = parts.next().map(str::parse::<ImportSection>);
                match (section, parts.next()) {
                    (Some(Ok(section)), Some(dir)) => {
                        let template = section.template();
                        match template
                            .to_xlsx()
                            .and_then(|bytes| Ok(write_file(Path::new(dir), template.filename, &bytes)?))
                        {
                            Ok(path) => println!("Template written to {}", path.display()),
                            Err(e) => print_status(&e.status()),
                        }
                    }
                    (Some(Err(e)), _) => println!("{}", e),
                    _ => println!("Usage: template <curriculum|plan> <dir>"),
                }
            }
            "export" => {
                let kind = parts.next().map(str::parse::<DocumentKind>);
                let format = parts.next().map(str::parse::<ExportFormat>);
                match (kind, format, parts.next()) {
                    (Some(Ok(kind)), Some(Ok(format)), Some(dir)) => {
                        let result = planner
                            .export_document(kind, format, dates::today())
                            .and_then(|file| {
                                Ok(write_file(Path::new(dir), &file.filename, &file.bytes)?)
                            });
                        print_status(&export_status(&result, &export_filename(kind, format)));
                        if let Ok(path) = result {
                            println!("Written to {}", path.display());
                        }
                    }
                    (Some(Err(e)), _, _) | (_, Some(Err(e)), _) => println!("{}", e),
                    _ => println!("Usage: export <plan|ledger> <xlsx|docx> <dir>"),
                }
            }
            _ => {
                println!("Unknown command. Type 'help' for usage.");
            }
        }
    }
}
