//! Subcommand handlers.
//!
//! Each handler calls one library use-case and prints a plain-text result.
//! Errors are returned untouched so the exit code can be derived from them.

use crate::cli::{AddParagraphArgs, Cli, Command, UpdateParagraphArgs};
use anyhow::{Context, Result};
use excerpt_core::{
    DuplicateTagPolicy, EditorProgram, Entity, ExternalEditor, FileConnectionProvider,
    LibraryConfig, LibraryService, NewParagraph, Paragraph, ParagraphPatch, RepoError,
    ServiceError, Tag, TextEditor,
};
use log::info;
use std::io::Write;
use std::path::Path;

/// Library handle plus the editor used by interactive commands.
struct Session {
    service: LibraryService<FileConnectionProvider>,
    editor: ExternalEditor,
}

impl Session {
    fn from_cli(cli: &Cli) -> Self {
        let editor = cli
            .editor
            .as_deref()
            .map(EditorProgram::parse)
            .unwrap_or_else(EditorProgram::from_env);
        let duplicate_tags = if cli.strict_tags {
            DuplicateTagPolicy::Reject
        } else {
            DuplicateTagPolicy::Absorb
        };
        let config = LibraryConfig::default()
            .with_db_path(cli.db.clone())
            .with_duplicate_tags(duplicate_tags)
            .with_editor(editor);

        Self {
            service: LibraryService::from_config(&config),
            editor: ExternalEditor::new(config.editor),
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let session = Session::from_cli(&cli);
    let mut out = std::io::stdout().lock();

    match cli.command {
        Command::Init => {
            let version = session.service.init()?;
            writeln!(out, "Database ready at {} (schema v{version})", cli.db.display())?;
        }
        Command::AddCollection { name } => {
            let collection = session.service.create_collection(&name)?;
            writeln!(out, "{}. {}", collection.id, collection.name)?;
        }
        Command::ListCollections => {
            for collection in session.service.list_collections()? {
                writeln!(out, "{}. {}", collection.id, collection.name)?;
            }
        }
        Command::AddTag { name, description } => {
            let tag = session.service.create_tag(&name, description.as_deref())?;
            writeln!(out, "{}", tag_line(&tag))?;
        }
        Command::ListTags => {
            for tag in session.service.list_tags()? {
                writeln!(out, "{}", tag_line(&tag))?;
            }
        }
        Command::AddParagraph(args) => {
            let paragraph = add_paragraph(&session, args)?;
            writeln!(out, "Paragraph {} added", paragraph.id)?;
        }
        Command::ShowParagraph { id } => {
            let paragraph = session
                .service
                .get_paragraph(id)?
                .ok_or_else(|| paragraph_not_found(id))?;
            write_paragraph(&mut out, &paragraph)?;
        }
        Command::UpdateParagraph(args) => {
            let paragraph = update_paragraph(&session, args)?;
            writeln!(out, "Paragraph {} updated", paragraph.id)?;
        }
        Command::EditParagraph { id } => {
            let before = session.service.get_paragraph(id)?;
            info!(
                "event=paragraph_edit module=cli status=start paragraph_id={id} editor={}",
                session.editor.program()
            );
            let paragraph = session.service.edit_paragraph_content(id, &session.editor)?;
            if before.as_ref() == Some(&paragraph) {
                writeln!(out, "Paragraph {id} unchanged")?;
            } else {
                writeln!(out, "Paragraph {id} updated")?;
            }
        }
        Command::DeleteParagraph { id } => {
            session.service.delete_paragraph(id)?;
            writeln!(out, "Paragraph {id} deleted")?;
        }
        Command::Generate { collection, output } => {
            let document = session.service.export_markdown(collection)?;
            match output {
                Some(path) => write_document(&path, &document)?,
                None => out.write_all(document.as_bytes())?,
            }
        }
    }

    Ok(())
}

fn add_paragraph(session: &Session, args: AddParagraphArgs) -> Result<Paragraph> {
    let content = match args.content {
        Some(content) => content,
        None => session
            .editor
            .edit("")
            .map_err(ServiceError::from)?
            .trim_end()
            .to_string(),
    };
    let paragraph = NewParagraph::new(args.collection, args.title, content).with_tags(args.tags);
    Ok(session.service.create_paragraph(&paragraph)?)
}

fn update_paragraph(session: &Session, args: UpdateParagraphArgs) -> Result<Paragraph> {
    let patch = ParagraphPatch {
        tag_ids: args.tag_ids(),
        title: args.title,
        content: args.content,
    };
    Ok(session.service.update_paragraph(args.id, &patch)?)
}

fn write_document(path: &Path, document: &str) -> Result<()> {
    std::fs::write(path, document)
        .with_context(|| format!("failed to write markdown to {}", path.display()))?;
    info!(
        "event=markdown_write module=cli status=ok bytes={}",
        document.len()
    );
    eprintln!("Markdown written to {}", path.display());
    Ok(())
}

fn write_paragraph(out: &mut impl Write, paragraph: &Paragraph) -> std::io::Result<()> {
    writeln!(out, "{}. {}", paragraph.id, paragraph.title)?;
    writeln!(out, "Collection: {}", paragraph.collection.name)?;
    let tags: Vec<&str> = paragraph.tags.iter().map(Tag::display_text).collect();
    if !tags.is_empty() {
        writeln!(out, "Tags: {}", tags.join(", "))?;
    }
    writeln!(out)?;
    writeln!(out, "{}", paragraph.content.trim_end())
}

fn tag_line(tag: &Tag) -> String {
    format!("{}. {} - {}", tag.id, tag.name, tag.display_text())
}

fn paragraph_not_found(id: i64) -> ServiceError {
    ServiceError::Repo(RepoError::NotFound {
        entity: Entity::Paragraph,
        id,
    })
}
