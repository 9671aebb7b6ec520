//! voxclone - 声音克隆命令行工具
//!
//! 样本校验和预处理、档案管理、单次/批量生成以及 HTTP 服务

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use voxclone::application::{
    AudioConverterPort, AudioInspectorPort, BatchProcessor, CreateProfile, CreateProfileHandler,
    DeleteProfile, DeleteProfileHandler, GeneratorConfig, GetProfile, GetProfileHandler,
    ListProfiles, ListProfilesHandler, ModelManager, ModelManagerConfig, PrepareOptions,
    ProfileRepositoryPort, SamplePreparer, SampleRequirements, SampleValidator, TtsBackendPort,
    VoiceGenerator,
};
use voxclone::config::{
    load_config_from_path, print_config, write_default_config, AppConfig, BackendKind, LogConfig,
};
use voxclone::domain::{parse_script, GenerationMode};
use voxclone::infrastructure::adapters::{
    FakeTtsBackend, FakeTtsConfig, FfmpegConverter, HttpTtsBackend, HttpTtsClientConfig,
    SymphoniaInspector, WavFileStorage,
};
use voxclone::infrastructure::http::{AppState, HttpServer};
use voxclone::infrastructure::persistence::JsonProfileRepository;

#[derive(Parser)]
#[command(name = "voxclone", version)]
#[command(about = "Voice cloning toolkit: sample preparation, voice profiles and speech generation")]
struct Cli {
    /// 配置文件路径（默认 voxclone.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate reference audio samples.
    Validate {
        /// Audio files to check.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert samples to the target format (trim, normalize, fade).
    Prepare {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Directory for the prepared WAV files.
        #[arg(long)]
        output_dir: PathBuf,
    },
    /// Create a voice profile from reference samples.
    CreateProfile {
        #[arg(long)]
        name: String,
        #[arg(long, num_args = 1.., required = true)]
        samples: Vec<PathBuf>,
        #[arg(long)]
        language: Option<String>,
        /// Transcript of the reference audio.
        #[arg(long)]
        transcript: Option<String>,
        #[arg(long)]
        emotion: Option<String>,
        /// Register samples as-is instead of converting them.
        #[arg(long)]
        no_prepare: bool,
    },
    /// Manage stored voice profiles.
    Profiles {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Generate speech for a text with a voice profile.
    Generate {
        #[arg(long)]
        profile: String,
        #[arg(long, conflicts_with = "text_file", required_unless_present = "text_file")]
        text: Option<String>,
        #[arg(long)]
        text_file: Option<PathBuf>,
        /// Output WAV path.
        #[arg(long)]
        output: PathBuf,
        /// clone / custom_voice / voice_design
        #[arg(long, default_value = "clone")]
        mode: String,
    },
    /// Generate one file per [MARKER] segment of a script.
    Batch {
        #[arg(long)]
        profile: String,
        #[arg(long)]
        script: PathBuf,
        #[arg(long)]
        output_dir: PathBuf,
        /// Append _2, _3 to repeated output names.
        #[arg(long)]
        unique_names: bool,
    },
    /// Smoke test: ffmpeg, backend, model load and an optional short generation.
    Test {
        #[arg(long)]
        profile: Option<String>,
    },
    /// Run the HTTP API.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Write the default configuration as TOML.
    InitConfig {
        #[arg(long, default_value = "voxclone.toml")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// List all profiles.
    List,
    /// Show one profile.
    Show { id: String },
    /// Delete a profile and its prepared samples.
    Delete { id: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// 初始化日志（只调用一次），输出到 stderr
fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},voxclone={},tower_http=debug", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// 返回 Ok(false) 表示命令执行完成但结果为失败
async fn run(cli: Cli) -> Result<bool> {
    if let Commands::InitConfig { path } = &cli.command {
        write_default_config(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(true);
    }

    let config = load_config_from_path(cli.config.as_deref()).context("Failed to load config")?;
    init_tracing(&config.log);
    print_config(&config);

    let app = App::new(config);

    match cli.command {
        Commands::Validate { files } => app.validate(&files),
        Commands::Prepare { files, output_dir } => app.prepare(&files, &output_dir).await,
        Commands::CreateProfile {
            name,
            samples,
            language,
            transcript,
            emotion,
            no_prepare,
        } => {
            app.create_profile(CreateProfile {
                name,
                samples,
                language,
                reference_text: transcript,
                emotion,
                prepare: !no_prepare,
            })
            .await
        }
        Commands::Profiles { command } => app.profiles(command).await,
        Commands::Generate {
            profile,
            text,
            text_file,
            output,
            mode,
        } => {
            let text = match (text, text_file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => bail!("Either --text or --text-file is required"),
            };
            let mode = mode.parse::<GenerationMode>().map_err(anyhow::Error::msg)?;
            app.generate(&profile, mode, &text, &output).await
        }
        Commands::Batch {
            profile,
            script,
            output_dir,
            unique_names,
        } => app.batch(&profile, &script, &output_dir, unique_names).await,
        Commands::Test { profile } => app.smoke_test(profile.as_deref()).await,
        Commands::Serve { host, port } => app.serve(host, port).await,
        Commands::InitConfig { .. } => Ok(true),
    }
}

/// 命令行共用的适配器和服务
struct App {
    config: AppConfig,
    profile_repo: Arc<dyn ProfileRepositoryPort>,
    inspector: Arc<dyn AudioInspectorPort>,
    converter: Arc<dyn AudioConverterPort>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            profile_repo: Arc::new(JsonProfileRepository::new(config.storage.profiles_dir.clone())),
            inspector: Arc::new(SymphoniaInspector::new()),
            converter: Arc::new(FfmpegConverter::new(config.audio.ffmpeg_path.clone())),
            config,
        }
    }

    fn validator(&self) -> SampleValidator {
        SampleValidator::new(
            self.inspector.clone(),
            SampleRequirements::from(&self.config.audio),
        )
    }

    fn preparer(&self) -> SamplePreparer {
        SamplePreparer::new(
            self.converter.clone(),
            self.inspector.clone(),
            PrepareOptions::from(&self.config.audio),
        )
    }

    fn backend(&self) -> Result<Arc<dyn TtsBackendPort>> {
        let backend: Arc<dyn TtsBackendPort> = match self.config.model.backend {
            BackendKind::Http => Arc::new(HttpTtsBackend::new(HttpTtsClientConfig::from(
                &self.config.model,
            ))?),
            BackendKind::Fake => Arc::new(FakeTtsBackend::new(FakeTtsConfig {
                sample_rate: self.config.generation.output_sample_rate,
                ..FakeTtsConfig::default()
            })),
        };
        Ok(backend)
    }

    async fn model_manager(&self) -> Result<Arc<ModelManager>> {
        Ok(Arc::new(
            ModelManager::new(ModelManagerConfig::from(&self.config.model), self.backend()?).await,
        ))
    }

    fn generator(&self, model_manager: Arc<ModelManager>) -> Arc<VoiceGenerator> {
        Arc::new(VoiceGenerator::new(
            GeneratorConfig::from(&self.config.generation),
            model_manager,
            Arc::new(WavFileStorage::new(self.config.audio.target_bit_depth)),
        ))
    }

    async fn loaded_generator(&self) -> Result<Arc<VoiceGenerator>> {
        let model_manager = self.model_manager().await?;
        if !model_manager.load().await {
            bail!(
                "Failed to load model {} on {}",
                self.config.model.name,
                model_manager.device()
            );
        }
        Ok(self.generator(model_manager))
    }

    async fn load_profile(&self, id: &str) -> Result<voxclone::domain::voice::VoiceProfile> {
        Ok(GetProfileHandler::new(self.profile_repo.clone())
            .load(GetProfile { id: id.to_string() })
            .await?)
    }

    fn validate(&self, files: &[PathBuf]) -> Result<bool> {
        let validator = self.validator();
        let mut all_valid = true;

        for file in files {
            let report = validator.validate_sample(file);
            println!("== {}", file.display());
            println!("{}", report);
            all_valid &= report.is_valid();
        }

        Ok(all_valid)
    }

    async fn prepare(&self, files: &[PathBuf], output_dir: &Path) -> Result<bool> {
        let preparer = self.preparer();
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let mut failures = 0usize;
        for file in files {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "sample".to_string());
            let output = output_dir.join(format!("{}.wav", stem));

            match preparer.prepare(file, &output).await {
                Ok(info) => println!(
                    "[ok] {} -> {} ({:.2}s, {} Hz, {} ch)",
                    file.display(),
                    output.display(),
                    info.duration_secs,
                    info.sample_rate,
                    info.channels
                ),
                Err(e) => {
                    failures += 1;
                    println!("[fail] {}: {}", file.display(), e);
                }
            }
        }

        println!("Prepared {}/{} samples", files.len() - failures, files.len());
        Ok(failures == 0)
    }

    async fn create_profile(&self, command: CreateProfile) -> Result<bool> {
        let handler = CreateProfileHandler::new(
            self.profile_repo.clone(),
            Arc::new(self.validator()),
            Arc::new(self.preparer()),
            self.inspector.clone(),
            self.config.storage.samples_dir.clone(),
        );
        let response = handler.handle(command).await?;

        for warning in &response.warnings {
            println!("warning: {}", warning);
        }
        println!("{}", response.profile);
        Ok(true)
    }

    async fn profiles(&self, command: ProfileCommands) -> Result<bool> {
        match command {
            ProfileCommands::List => {
                let profiles = ListProfilesHandler::new(self.profile_repo.clone())
                    .handle(ListProfiles)
                    .await?;
                if profiles.is_empty() {
                    println!("No profiles in {}", self.config.storage.profiles_dir.display());
                }
                for p in profiles {
                    println!(
                        "{:<24} {:<24} {:<6} {:>2} samples {:>7.2}s",
                        p.id, p.name, p.language, p.sample_count, p.total_duration_secs
                    );
                }
            }
            ProfileCommands::Show { id } => {
                let profile = GetProfileHandler::new(self.profile_repo.clone())
                    .handle(GetProfile { id })
                    .await?;
                println!("{}", profile);
            }
            ProfileCommands::Delete { id } => {
                DeleteProfileHandler::new(
                    self.profile_repo.clone(),
                    self.config.storage.samples_dir.clone(),
                )
                .handle(DeleteProfile { id: id.clone() })
                .await?;
                println!("Deleted profile {}", id);
            }
        }
        Ok(true)
    }

    async fn generate(
        &self,
        profile_id: &str,
        mode: GenerationMode,
        text: &str,
        output: &Path,
    ) -> Result<bool> {
        let profile = self.load_profile(profile_id).await?;
        let generator = self.loaded_generator().await?;

        let outcome = generator.try_generate(mode, text, &profile, output).await?;
        println!(
            "Generated {} ({} chunks, {:.2}s)",
            outcome.output_path.display(),
            outcome.chunk_count,
            outcome.duration_secs
        );
        Ok(true)
    }

    async fn batch(
        &self,
        profile_id: &str,
        script: &Path,
        output_dir: &Path,
        unique_names: bool,
    ) -> Result<bool> {
        let document = tokio::fs::read_to_string(script)
            .await
            .with_context(|| format!("Failed to read {}", script.display()))?;
        let segments = parse_script(&document);
        if segments.is_empty() {
            bail!("{} contains no [MARKER] segments with text", script.display());
        }

        let profile = self.load_profile(profile_id).await?;
        let generator = self.loaded_generator().await?;
        let processor = BatchProcessor::new(
            generator,
            unique_names || self.config.batch.unique_output_names,
        );

        let report = processor.process(&segments, &profile, output_dir).await;
        print!("{}", report);
        Ok(report.is_complete())
    }

    async fn smoke_test(&self, profile_id: Option<&str>) -> Result<bool> {
        match self.converter.ensure_available().await {
            Ok(version) => println!("[ok] ffmpeg: {}", version),
            Err(e) => {
                println!("[fail] ffmpeg: {}", e);
                return Ok(false);
            }
        }

        let model_manager = self.model_manager().await?;
        if !model_manager.backend().health_check().await {
            println!("[fail] backend unreachable: {}", self.config.model.url);
            return Ok(false);
        }
        println!("[ok] backend: {:?}", self.config.model.backend);

        if !model_manager.load().await {
            println!("[fail] model load: {}", self.config.model.name);
            return Ok(false);
        }
        let status = model_manager.status().await;
        println!(
            "[ok] model: {} on {} ({})",
            status.model_name, status.device, status.precision
        );

        let Some(profile_id) = profile_id else {
            model_manager.unload().await;
            return Ok(true);
        };

        let profile = self.load_profile(profile_id).await?;
        let output = std::env::temp_dir().join(format!("voxclone_test_{}.wav", profile.id()));
        let generator = self.generator(model_manager.clone());
        let ok = generator
            .generate("This is a short voice cloning test.", &profile, &output)
            .await;
        if ok {
            println!("[ok] generation: {}", output.display());
        } else {
            println!("[fail] generation with profile {}", profile_id);
        }

        model_manager.unload().await;
        Ok(ok)
    }

    async fn serve(self, host: Option<String>, port: Option<u16>) -> Result<bool> {
        let mut server_config = self.config.server.clone();
        if let Some(host) = host {
            server_config.host = host;
        }
        if let Some(port) = port {
            server_config.port = port;
        }

        tokio::fs::create_dir_all(&self.config.storage.output_dir).await?;

        let model_manager = self.model_manager().await?;
        if !model_manager.load().await {
            tracing::warn!("Model not loaded at startup, use POST /api/model/load to retry");
        }

        let state = AppState::new(
            self.profile_repo.clone(),
            model_manager.clone(),
            self.generator(model_manager.clone()),
            self.config.storage.samples_dir.clone(),
            self.config.storage.output_dir.clone(),
            self.config.batch.unique_output_names,
        );

        HttpServer::new(server_config, state)
            .run_with_shutdown(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for ctrl-c");
                    std::future::pending::<()>().await;
                }
                tracing::info!("Received shutdown signal");
            })
            .await?;

        model_manager.unload().await;
        tracing::info!("Server shutdown complete");
        Ok(true)
    }
}
