use planner_common::db::create_db_thread_pool;
use planner_common::db::job_registry::Dao as JobRegistryDao;

use flexi_logger::{
    Age, Cleanup, Criterion, Duplicate, FileSpec, LogSpecification, Logger, Naming, WriteMode,
};
use runner::JobRunner;
use std::time::UNIX_EPOCH;

mod env;
mod jobs;
mod runner;

use jobs::BackfillDefaultCategoriesJob;

fn main() {
    let mut run_once = false;

    let mut args = std::env::args();

    // Eat the first argument, which is the relative path to the executable
    args.next();

    for arg in args {
        match arg.to_lowercase().as_str() {
            "--run-once" => run_once = true,
            a => {
                eprintln!("ERROR: Invalid argument: {}", &a);
                std::process::exit(1);
            }
        }
    }

    let log_spec = match LogSpecification::parse(&env::CONF.log_level) {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "ERROR: Invalid log level '{}': {e}. Options: ERROR, WARN, INFO, DEBUG, TRACE. \
                 Example: `info, my::critical::module=trace`",
                env::CONF.log_level
            );
            std::process::exit(1);
        }
    };

    let _logger = match Logger::with(log_spec)
        .log_to_file(FileSpec::default().directory("./logs"))
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogAndCompressedFiles(60, 365),
        )
        .cleanup_in_background_thread(true)
        .duplicate_to_stdout(Duplicate::All)
        .write_mode(WriteMode::BufferAndFlush)
        .format(|writer, now, record| {
            write!(
                writer,
                "{:5} | {} | {}:{} | {}",
                record.level(),
                now.format("%Y-%m-%dT%H:%M:%S%.6fZ"),
                record.module_path().unwrap_or("<unknown>"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .use_utc()
        .start()
    {
        Ok(l) => l,
        Err(e) => {
            eprintln!("ERROR: Failed to start logger: {e}");
            std::process::exit(1);
        }
    };

    log::info!("Connecting to database...");

    let db_thread_pool = match create_db_thread_pool(
        &env::CONF.database_uri(),
        env::CONF.db_max_connections,
        env::CONF.db_idle_timeout,
    ) {
        Ok(p) => p,
        Err(e) => {
            log::error!("Failed to connect to database: {e}");
            eprintln!("ERROR: Failed to connect to database");
            std::process::exit(1);
        }
    };

    log::info!("Successfully connected to database");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(env::CONF.worker_threads)
        .max_blocking_threads(env::CONF.max_blocking_threads)
        .enable_all()
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            log::error!("Failed to launch asynchronous runtime: {e}");
            eprintln!("ERROR: Failed to launch asynchronous runtime");
            std::process::exit(1);
        }
    };

    runtime.block_on(async move {
        let registry_dao = JobRegistryDao::new(&db_thread_pool);
        match tokio::task::spawn_blocking(move || registry_dao.get_all_job_runs()).await {
            Ok(Ok(known_jobs)) => {
                for item in known_jobs {
                    let last_run = item
                        .last_run_timestamp
                        .duration_since(UNIX_EPOCH)
                        .map(|d| d.as_secs())
                        .unwrap_or(0);

                    log::info!("Job \"{}\" last ran at {} (Unix time)", item.job_name, last_run);
                }
            }
            Ok(Err(e)) => log::error!("Failed to load job registry: {e}"),
            Err(e) => log::error!("Failed to join Tokio task: {e}"),
        }

        let mut job_runner = JobRunner::new(env::CONF.update_frequency, db_thread_pool.clone());

        job_runner
            .register(
                Box::new(BackfillDefaultCategoriesJob::new(db_thread_pool.clone())),
                env::CONF.backfill_default_categories_job_frequency,
            )
            .await;

        if run_once {
            let job_count = job_runner.run_once().await;
            log::info!("Ran {job_count} jobs once. Exiting.");
        } else {
            job_runner.start().await;
        }
    });

    drop(runtime);

    // Safe because all other threads have been joined at this point
    unsafe {
        env::CONF.zeroize();
    }
}
