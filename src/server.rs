use super::*;

#[derive(Debug, Default)]
pub struct Server(Arc<tokio::sync::Mutex<Inner>>);

impl Server {
  pub fn capabilities() -> lsp::ServerCapabilities {
    lsp::ServerCapabilities {
      completion_provider: Some(lsp::CompletionOptions {
        trigger_characters: Some(
          ["-", "@", "$"].iter().map(ToString::to_string).collect(),
        ),
        ..Default::default()
      }),
      hover_provider: Some(lsp::HoverProviderCapability::Simple(true)),
      text_document_sync: Some(lsp::TextDocumentSyncCapability::Options(
        lsp::TextDocumentSyncOptions {
          open_close: Some(true),
          change: Some(lsp::TextDocumentSyncKind::INCREMENTAL),
          will_save: None,
          will_save_wait_until: None,
          save: Some(
            lsp::SaveOptions {
              include_text: Some(false),
            }
            .into(),
          ),
        },
      )),
      ..Default::default()
    }
  }

  pub fn new() -> Self {
    Self::default()
  }

  async fn project(&self) -> Option<Arc<Project>> {
    self.0.lock().await.project.clone()
  }

  pub async fn run() -> Result {
    let (service, socket) = LspService::new(|_| Server::new());

    tower_lsp::Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
      .serve(service)
      .await;

    Ok(())
  }
}

/// Runs `f` on a blocking worker. The token handed to `f` is cancelled if
/// the request is abandoned before `f` returns.
async fn blocking<T, F>(f: F) -> Result<T, jsonrpc::Error>
where
  F: FnOnce(CancellationToken) -> Result<T, Cancelled> + Send + 'static,
  T: Send + 'static,
{
  let token = CancellationToken::new();

  let _guard = CancelOnDrop(token.clone());

  match tokio::task::spawn_blocking(move || f(token)).await {
    Ok(Ok(value)) => Ok(value),
    Ok(Err(Cancelled)) => Err(jsonrpc::Error::request_cancelled()),
    Err(error) => {
      log::warn!("resolution worker failed: {error}");
      Err(jsonrpc::Error::internal_error())
    }
  }
}

#[tower_lsp::async_trait]
impl LanguageServer for Server {
  async fn completion(
    &self,
    _params: lsp::CompletionParams,
  ) -> Result<Option<lsp::CompletionResponse>, jsonrpc::Error> {
    let Some(project) = self.project().await else {
      return Ok(None);
    };

    let items = blocking(move |token| {
      let scope = project.effective_scope();

      let resolver = Resolver::new(&project, &scope, &token);

      let mut items = Vec::new();

      for name in project.variable_names() {
        let value = resolver.resolve_default(&name)?;

        items.push(lsp::CompletionItem {
          kind: Some(match value.as_ref().map(|value| value.kind) {
            Some(ValueKind::Color) => lsp::CompletionItemKind::COLOR,
            _ => lsp::CompletionItemKind::VARIABLE,
          }),
          documentation: value
            .as_ref()
            .and_then(ContextValue::color)
            .map(|color| lsp::Documentation::String(color.to_string())),
          detail: value.map(|value| value.info.resolved),
          label: name,
          ..Default::default()
        });
      }

      Ok(items)
    })
    .await?;

    Ok(Some(lsp::CompletionResponse::Array(items)))
  }

  async fn did_change(&self, params: lsp::DidChangeTextDocumentParams) {
    self.0.lock().await.did_change(params);
  }

  async fn did_change_configuration(
    &self,
    params: lsp::DidChangeConfigurationParams,
  ) {
    self.0.lock().await.did_change_configuration(params);
  }

  async fn did_close(&self, params: lsp::DidCloseTextDocumentParams) {
    self.0.lock().await.did_close(params);
  }

  async fn did_open(&self, params: lsp::DidOpenTextDocumentParams) {
    self.0.lock().await.did_open(params);
  }

  async fn did_save(&self, params: lsp::DidSaveTextDocumentParams) {
    self.0.lock().await.did_save(params);
  }

  async fn hover(
    &self,
    params: lsp::HoverParams,
  ) -> Result<Option<lsp::Hover>, jsonrpc::Error> {
    let Some((project, name, range)) = self.0.lock().await.hover_target(params)
    else {
      return Ok(None);
    };

    let resolution =
      blocking(move |token| project.resolve(&name, &token)).await?;

    if resolution.is_empty() {
      return Ok(None);
    }

    Ok(Some(lsp::Hover {
      contents: lsp::HoverContents::Markup(lsp::MarkupContent {
        kind: lsp::MarkupKind::Markdown,
        value: resolution.markdown(),
      }),
      range: Some(range),
    }))
  }

  async fn initialize(
    &self,
    params: lsp::InitializeParams,
  ) -> Result<lsp::InitializeResult, jsonrpc::Error> {
    self.0.lock().await.initialize(params)
  }

  async fn initialized(&self, _: lsp::InitializedParams) {
    let Some(project) = self.project().await else {
      return;
    };

    if project.root().as_os_str().is_empty() {
      log::info!("no workspace root, indexing open documents only");
      return;
    }

    if let Err(error) =
      tokio::task::spawn_blocking(move || project.index_directory()).await
    {
      log::warn!("workspace indexing failed: {error}");
    }
  }

  async fn shutdown(&self) -> Result<(), jsonrpc::Error> {
    Ok(())
  }
}

#[derive(Debug, Default)]
struct Inner {
  documents: BTreeMap<lsp::Url, Document>,
  project: Option<Arc<Project>>,
}

impl Inner {
  fn did_change(&mut self, params: lsp::DidChangeTextDocumentParams) {
    let uri = params.text_document.uri.clone();

    if let Some(document) = self.documents.get_mut(&uri) {
      document.apply_change(params);
      self.reindex(&uri);
    }
  }

  fn did_change_configuration(
    &mut self,
    params: lsp::DidChangeConfigurationParams,
  ) {
    let Some(project) = &self.project else {
      return;
    };

    match Settings::from_client(params.settings) {
      Ok(settings) => project.set_settings(settings),
      Err(error) => log::warn!("ignoring invalid settings: {error:#}"),
    }
  }

  /// Drops the buffer and falls back to the file on disk, if any.
  fn did_close(&mut self, params: lsp::DidCloseTextDocumentParams) {
    let Some(document) = self.documents.remove(&params.text_document.uri)
    else {
      return;
    };

    if let (Some(project), Some(path)) = (&self.project, document.path()) {
      if Project::is_stylesheet(&path) && project.filesystem().is_file(&path) {
        if let Err(error) = project.index_file(&path) {
          log::debug!(
            "keeping buffer contents of `{}`: {error:#}",
            path.display()
          );
        }
      }
    }
  }

  fn did_open(&mut self, params: lsp::DidOpenTextDocumentParams) {
    let uri = params.text_document.uri.clone();
    self.documents.insert(uri.clone(), Document::from(params));
    self.reindex(&uri);
  }

  fn did_save(&mut self, params: lsp::DidSaveTextDocumentParams) {
    self.reindex(&params.text_document.uri);
  }

  fn hover_target(
    &self,
    params: lsp::HoverParams,
  ) -> Option<(Arc<Project>, String, lsp::Range)> {
    let lsp::TextDocumentPositionParams {
      text_document,
      position,
    } = params.text_document_position_params;

    let (name, range) = self
      .documents
      .get(&text_document.uri)?
      .variable_at(position)?;

    Some((Arc::clone(self.project.as_ref()?), name, range))
  }

  fn initialize(
    &mut self,
    params: lsp::InitializeParams,
  ) -> Result<lsp::InitializeResult, jsonrpc::Error> {
    log::info!("Starting {}...", env!("CARGO_PKG_NAME"));

    let root = Self::root(&params).unwrap_or_default();

    let project = Project::new(root, Arc::new(OsFileSystem));

    if let Some(options) = params.initialization_options {
      match Settings::from_client(options) {
        Ok(settings) => project.set_settings(settings),
        Err(error) => log::warn!("ignoring invalid settings: {error:#}"),
      }
    }

    self.project = Some(Arc::new(project));

    Ok(lsp::InitializeResult {
      capabilities: Server::capabilities(),
      server_info: Some(lsp::ServerInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
      }),
    })
  }

  /// Re-indexes an open stylesheet from its buffer.
  fn reindex(&self, uri: &lsp::Url) {
    let (Some(project), Some(document)) =
      (&self.project, self.documents.get(uri))
    else {
      return;
    };

    match document.path() {
      Some(path) if Project::is_stylesheet(&path) => {
        project.index_text(&path, &document.text());
      }
      _ => log::debug!("not indexing `{uri}`"),
    }
  }

  fn root(params: &lsp::InitializeParams) -> Option<PathBuf> {
    #[allow(deprecated)]
    let root_uri = params.root_uri.as_ref();

    params
      .workspace_folders
      .as_ref()
      .and_then(|folders| folders.first())
      .map(|folder| &folder.uri)
      .or(root_uri)
      .and_then(|uri| uri.to_file_path().ok())
  }
}
