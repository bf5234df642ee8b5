//! Demonstration/debugging front-end for `duke-lift`.
//!
//! There is no class-file reader in this workspace (parsing the class-file container stays out of
//! scope, per the core spec), so this binary builds one synthetic [`MethodEnvelope`] for a chosen
//! scenario, runs it through [`Lifter::lift`], and prints the result with `{:#?}`.

use clap::{Parser, ValueEnum};
use duke::tree::class::ClassName;
use duke::tree::field::{FieldDescriptor, FieldRef as DukeFieldRef};
use duke::tree::method::code::{Code, Instruction, InstructionListEntry, Label, LvIndex};
use duke::tree::method::{MethodDescriptor, MethodName, MethodRef as DukeMethodRef};
use duke_lift::lifter::Lifter;
use duke_lift::method_envelope::MethodEnvelope;
use duke_lift::types;

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let level = match cli.quiet {
		true => log::LevelFilter::Error,
		false => match cli.verbose {
			0 => log::LevelFilter::Info,
			1 => log::LevelFilter::Debug,
			_ => log::LevelFilter::Trace,
		},
	};

	fern::Dispatch::new()
		.format(|out, message, record| {
			out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message));
		})
		.level(level)
		.chain(std::io::stderr())
		.apply()?;

	let envelope = cli.scenario.build();

	match Lifter::lift(&envelope) {
		Ok(lifted) => {
			println!("arguments:");
			for argument in &lifted.arguments {
				println!("  {argument:#?}");
			}
			println!("operations:");
			for (index, op) in &lifted.operations {
				println!("  [{index}] {op:#?}");
			}
			if cli.show_expressions {
				println!("expressions by source index:");
				let mut entries: Vec<_> = lifted.expressions_by_index.iter().collect();
				entries.sort_by_key(|(index, _)| **index);
				for (index, expr) in entries {
					println!("  [{index}] {expr:#?}");
				}
			}
		},
		Err(failure) => {
			eprintln!("lift failed: {failure}");
			std::process::exit(1);
		},
	}

	Ok(())
}

/// Dumps the lifted IR for one of the literal end-to-end scenarios from the core spec, built
/// in-process since this workspace has no class-file reader to source one from a real `.class`.
#[derive(Debug, Parser)]
struct Cli {
	/// Which built-in scenario to lift and print.
	scenario: Scenario,

	/// Also print the expressions pushed by every instruction, not just emitted operations.
	#[arg(short = 'e', long)]
	show_expressions: bool,

	/// Increase logging verbosity (-v for debug, -vv for trace).
	#[arg(short = 'v', long, action = clap::ArgAction::Count)]
	verbose: u8,

	/// Suppress all logging but errors.
	#[arg(short = 'q', long)]
	quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
	/// `ICONST_3; IRETURN`
	ConstantReturn,
	/// `(II)I`, not static: `ILOAD_1; ILOAD_2; IADD; IRETURN`
	AddArguments,
	/// `GETSTATIC f:I; ICONST_1; IADD; PUTSTATIC f:I; RETURN`
	StaticFieldIncrement,
	/// local 1 bound to `arg1:int`: `IINC 1, 5; ILOAD_1; IRETURN`
	LocalIncrement,
	/// `ALOAD_0; INVOKEVIRTUAL m()I; POP; RETURN`
	VirtualInvokeDiscarded,
	/// `ALOAD_1; ICONST_0; ICONST_7; IASTORE; RETURN`
	ArrayStore,
}

fn demo_class() -> ClassName {
	unsafe { ClassName::from_inner_unchecked("com/example/Demo".into()) }
}

fn demo_method_name(name: &str) -> MethodName {
	MethodName::try_from(java_string::JavaString::from(name)).expect("valid method name")
}

fn label(id: u16) -> Label {
	Label { id }
}

fn unlabeled(instruction: Instruction) -> InstructionListEntry {
	InstructionListEntry { label: None, instruction }
}

fn labeled(id: u16, instruction: Instruction) -> InstructionListEntry {
	InstructionListEntry { label: Some(label(id)), instruction }
}

impl Scenario {
	fn build(self) -> MethodEnvelope {
		match self {
			Scenario::ConstantReturn => MethodEnvelope {
				owning_class: demo_class(),
				name: demo_method_name("constantReturn"),
				argument_types: vec![],
				return_type: types::parse_descriptor(java_string::JavaStr::from_str("I")).unwrap(),
				is_static: true,
				code: Code {
					max_stack: 1,
					max_locals: 0,
					instructions: vec![
						labeled(0, Instruction::IConst3),
						unlabeled(Instruction::IReturn),
					],
				},
			},
			Scenario::AddArguments => MethodEnvelope {
				owning_class: demo_class(),
				name: demo_method_name("addArguments"),
				argument_types: vec![
					types::parse_descriptor(java_string::JavaStr::from_str("I")).unwrap(),
					types::parse_descriptor(java_string::JavaStr::from_str("I")).unwrap(),
				],
				return_type: types::parse_descriptor(java_string::JavaStr::from_str("I")).unwrap(),
				is_static: false,
				code: Code {
					max_stack: 2,
					max_locals: 3,
					instructions: vec![
						labeled(0, Instruction::ILoad(LvIndex { index: 1 })),
						unlabeled(Instruction::ILoad(LvIndex { index: 2 })),
						unlabeled(Instruction::IAdd),
						unlabeled(Instruction::IReturn),
					],
				},
			},
			Scenario::StaticFieldIncrement => {
				let field = DukeFieldRef {
					class: unsafe { duke::tree::class::ObjClassName::from_inner_unchecked("com/example/Demo".into()) },
					name: duke::tree::field::FieldName::try_from(java_string::JavaString::from("f")).unwrap(),
					desc: FieldDescriptor::try_from(java_string::JavaString::from("I")).unwrap(),
				};
				MethodEnvelope {
					owning_class: demo_class(),
					name: demo_method_name("staticFieldIncrement"),
					argument_types: vec![],
					return_type: types::Type::Void,
					is_static: true,
					code: Code {
						max_stack: 2,
						max_locals: 0,
						instructions: vec![
							labeled(0, Instruction::GetStatic(field.clone())),
							unlabeled(Instruction::IConst1),
							unlabeled(Instruction::IAdd),
							unlabeled(Instruction::PutStatic(field)),
							unlabeled(Instruction::Return),
						],
					},
				}
			},
			Scenario::LocalIncrement => MethodEnvelope {
				owning_class: demo_class(),
				name: demo_method_name("localIncrement"),
				argument_types: vec![types::parse_descriptor(java_string::JavaStr::from_str("I")).unwrap()],
				return_type: types::parse_descriptor(java_string::JavaStr::from_str("I")).unwrap(),
				is_static: false,
				code: Code {
					max_stack: 1,
					max_locals: 2,
					instructions: vec![
						labeled(0, Instruction::IInc(LvIndex { index: 1 }, 5)),
						unlabeled(Instruction::ILoad(LvIndex { index: 1 })),
						unlabeled(Instruction::IReturn),
					],
				},
			},
			Scenario::VirtualInvokeDiscarded => {
				let method = DukeMethodRef {
					class: demo_class(),
					name: demo_method_name("m"),
					desc: MethodDescriptor::try_from(java_string::JavaString::from("()I")).unwrap(),
				};
				MethodEnvelope {
					owning_class: demo_class(),
					name: demo_method_name("virtualInvokeDiscarded"),
					argument_types: vec![],
					return_type: types::Type::Void,
					is_static: false,
					code: Code {
						max_stack: 1,
						max_locals: 1,
						instructions: vec![
							labeled(0, Instruction::ALoad(LvIndex { index: 0 })),
							unlabeled(Instruction::InvokeVirtual(method)),
							unlabeled(Instruction::Pop),
							unlabeled(Instruction::Return),
						],
					},
				}
			},
			Scenario::ArrayStore => MethodEnvelope {
				owning_class: demo_class(),
				name: demo_method_name("arrayStore"),
				argument_types: vec![types::parse_descriptor(java_string::JavaStr::from_str("[I")).unwrap()],
				return_type: types::Type::Void,
				is_static: false,
				code: Code {
					max_stack: 3,
					max_locals: 2,
					instructions: vec![
						labeled(0, Instruction::ALoad(LvIndex { index: 1 })),
						unlabeled(Instruction::IConst0),
						unlabeled(Instruction::BiPush(7)),
						unlabeled(Instruction::IAStore),
						unlabeled(Instruction::Return),
					],
				},
			},
		}
	}
}
